//! Department name to short-code lookup used in bar labels.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::RecordError;

/// Exact-match mapping from full department name to a short code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DepartmentCodes(BTreeMap<String, String>);

impl Default for DepartmentCodes {
    fn default() -> Self {
        [
            ("総合外科", "総"),
            ("乳腺外科", "乳"),
            ("心臓血管外科", "心"),
            ("整形外科・スポーツ診療科", "整"),
            ("形成外科", "形"),
            ("産科・婦人科", "産"),
            ("腎・高血圧内科", "腎"),
            ("小児外科", "小"),
            ("眼科", "眼"),
            ("循環器内科", "循"),
            ("呼吸器外科", "呼"),
            ("泌尿器科", "泌"),
            ("耳鼻咽喉・頭頚科", "耳"),
            ("脳神経外科", "脳"),
            ("麻酔科・ペインクリニック", "麻"),
        ]
        .into_iter()
        .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DepartmentCodes {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, code)| (name.into(), code.into()))
                .collect(),
        )
    }
}

impl DepartmentCodes {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, name: impl Into<String>, code: impl Into<String>) {
        self.0.insert(name.into(), code.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Short code for `name`; unmapped names fall back to their first character.
    pub fn short_code(&self, name: &str) -> Result<String, RecordError> {
        if let Some(code) = self.0.get(name) {
            return Ok(code.clone());
        }
        name.chars()
            .next()
            .map(String::from)
            .ok_or(RecordError::MissingField("department"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapped_and_fallback_codes() {
        let codes = DepartmentCodes::default();
        assert_eq!(codes.short_code("総合外科").unwrap(), "総");
        assert_eq!(codes.short_code("整形外科・スポーツ診療科").unwrap(), "整");
        assert_eq!(codes.short_code("外来").unwrap(), "外");
    }

    #[test]
    fn empty_name_is_a_missing_field() {
        let codes = DepartmentCodes::default();
        assert_eq!(
            codes.short_code(""),
            Err(RecordError::MissingField("department"))
        );
    }

    #[test]
    fn custom_mapping_overrides() {
        let mut codes = DepartmentCodes::empty();
        codes.insert("外来", "来");
        assert_eq!(codes.short_code("外来").unwrap(), "来");
        assert_eq!(codes.len(), 1);
    }
}
