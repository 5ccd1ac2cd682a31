use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub title: String,
    pub file_path: String,
}

/// Display information for every step of a pipeline, keyed by step uuid.
pub type ConnectionDict = HashMap<String, ConnectionInfo>;

/// One row of the incoming-connections list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionEntry {
    pub uuid: String,
    pub title: String,
    pub file_path: String,
}

impl ConnectionEntry {
    /// Resolve `uuid` against `dict`, falling back to the bare uuid for steps
    /// that are not (yet) known.
    pub fn resolve(uuid: &str, dict: &ConnectionDict) -> Self {
        match dict.get(uuid) {
            Some(info) => Self {
                uuid: uuid.to_string(),
                title: info.title.clone(),
                file_path: info.file_path.clone(),
            },
            None => Self {
                uuid: uuid.to_string(),
                title: uuid.to_string(),
                file_path: String::new(),
            },
        }
    }
}

/// Move `items[from]` so that it ends up at index `to`.
///
/// Returns `false` without touching `items` when the indices are equal or out
/// of range.
pub fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from == to || from >= items.len() || to >= items.len() {
        return false;
    }
    let item = items.remove(from);
    items.insert(to, item);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_item_down_and_up() {
        let mut items = vec!["A", "B", "C", "D"];
        assert!(move_item(&mut items, 1, 3));
        assert_eq!(items, vec!["A", "C", "D", "B"]);

        assert!(move_item(&mut items, 3, 0));
        assert_eq!(items, vec!["B", "A", "C", "D"]);
    }

    #[test]
    fn move_item_rejects_no_ops() {
        let mut items = vec!["A", "B", "C"];
        assert!(!move_item(&mut items, 1, 1));
        assert!(!move_item(&mut items, 3, 0));
        assert!(!move_item(&mut items, 0, 3));
        assert_eq!(items, vec!["A", "B", "C"]);
    }

    #[test]
    fn unknown_connections_fall_back_to_uuid() {
        let mut dict = ConnectionDict::new();
        dict.insert(
            "s1".into(),
            ConnectionInfo {
                title: "Load".into(),
                file_path: "load.py".into(),
            },
        );

        assert_eq!(ConnectionEntry::resolve("s1", &dict).title, "Load");
        let missing = ConnectionEntry::resolve("s2", &dict);
        assert_eq!(missing.title, "s2");
        assert!(missing.file_path.is_empty());
    }
}
