use gpui::*;
use gpui_component::Root;

use gpui_step_details_story::{logging, step_details::StepDetailsExample};

fn main() {
    if let Err(err) = logging::init() {
        eprintln!("failed to initialize logging: {err:#}");
    }

    let app = Application::new();

    app.run(move |cx| {
        gpui_component::init(cx);
        gpui_dnd_reorder::init(cx);
        cx.activate(true);

        cx.spawn(async move |cx| {
            cx.open_window(
                WindowOptions {
                    titlebar: Some(TitlebarOptions {
                        title: Some("Step Details".into()),
                        appears_transparent: false,
                        traffic_light_position: None,
                    }),
                    ..Default::default()
                },
                |window, cx| {
                    let view = StepDetailsExample::view(window, cx);
                    cx.new(|cx| Root::new(view, window, cx))
                },
            )?;

            Ok::<_, anyhow::Error>(())
        })
        .detach();
    });
}
