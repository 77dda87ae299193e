//! Dense integer IDs for product labels.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Product label → ID mapping, in first-occurrence order.
///
/// Built once per dataset and never mutated afterwards; pass it by reference
/// to anything that needs to translate between labels and IDs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductEncoding {
    labels: Vec<String>,
    ids: HashMap<String, usize>,
}

impl ProductEncoding {
    /// Encode `labels`, returning the mapping and the per-row IDs.
    pub fn encode<S: AsRef<str>>(labels: &[S]) -> (Self, Vec<usize>) {
        let mut encoding = Self {
            labels: Vec::new(),
            ids: HashMap::new(),
        };

        let row_ids = labels
            .iter()
            .map(|label| encoding.intern(label.as_ref()))
            .collect();

        (encoding, row_ids)
    }

    fn from_labels(labels: Vec<String>) -> Result<Self, String> {
        let mut ids = HashMap::with_capacity(labels.len());
        for (id, label) in labels.iter().enumerate() {
            if ids.insert(label.clone(), id).is_some() {
                return Err(format!("Duplicate product label '{label}' in encoding."));
            }
        }
        Ok(Self { labels, ids })
    }

    fn intern(&mut self, label: &str) -> usize {
        if let Some(&id) = self.ids.get(label) {
            return id;
        }
        let id = self.labels.len();
        self.labels.push(label.to_string());
        self.ids.insert(label.to_string(), id);
        id
    }

    pub fn id_of(&self, label: &str) -> Option<usize> {
        self.ids.get(label).copied()
    }

    pub fn label_of(&self, id: usize) -> Option<&str> {
        self.labels.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// `(id, label)` pairs in ID order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.labels.iter().enumerate().map(|(id, l)| (id, l.as_str()))
    }
}

impl Serialize for ProductEncoding {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.labels.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ProductEncoding {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let labels = Vec::<String>::deserialize(deserializer)?;
        Self::from_labels(labels).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_first_occurrence() {
        let (enc, ids) = ProductEncoding::encode(&["tea", "coffee", "tea", "cocoa", "coffee"]);
        assert_eq!(ids, vec![0, 1, 0, 2, 1]);
        assert_eq!(enc.id_of("cocoa"), Some(2));
        assert_eq!(enc.label_of(1), Some("coffee"));
        assert_eq!(enc.len(), 3);
    }

    #[test]
    fn distinct_labels_get_dense_ids() {
        let labels: Vec<String> = (0..25).map(|i| format!("sku-{i}")).collect();
        let (enc, ids) = ProductEncoding::encode(&labels);
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..25).collect::<Vec<_>>());
        assert_eq!(enc.iter().count(), 25);
    }

    #[test]
    fn unknown_label_is_none() {
        let (enc, _) = ProductEncoding::encode(&["a"]);
        assert_eq!(enc.id_of("b"), None);
        assert_eq!(enc.label_of(7), None);
    }

    #[test]
    fn json_keeps_order_and_rejects_duplicates() {
        let (enc, _) = ProductEncoding::encode(&["b", "a"]);
        let json = serde_json::to_string(&enc).unwrap();
        assert_eq!(json, r#"["b","a"]"#);
        let back: ProductEncoding = serde_json::from_str(&json).unwrap();
        assert_eq!(back, enc);

        assert!(serde_json::from_str::<ProductEncoding>(r#"["a","a"]"#).is_err());
    }
}
