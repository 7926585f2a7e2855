// 注册时的覆写加载计划
//
// 每次激活都从当前地址重新计算，执行顺序固定：清空 → 移除 → 应用。

use crate::codec;
use crate::config::{CLEAR_SENTINEL, ClearMode};
use crate::registry::Overrides;
use url::Url;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadPlan {
    pub overrides_to_apply: Overrides,
    pub should_clear_all: bool,
    pub keys_to_remove: Vec<String>,
}

impl LoadPlan {
    pub fn from_url(url: &Url, prefix: &str, clear_mode: ClearMode) -> Self {
        let entries = codec::scan_namespace(url, prefix);
        Self::from_entries(&entries, clear_mode)
    }

    // entries 为去掉前缀后的 (开关键, 原始值)
    pub fn from_entries(entries: &[(String, String)], clear_mode: ClearMode) -> Self {
        let mut plan = Self::default();
        let mut has_sentinel = false;

        for (flag_key, raw_value) in entries {
            if flag_key == CLEAR_SENTINEL {
                has_sentinel = true;
                continue;
            }
            if flag_key.is_empty() {
                log::warn!("忽略缺少开关键的覆写参数（值：{}）", raw_value);
                continue;
            }
            if raw_value.is_empty() {
                if !plan.keys_to_remove.contains(flag_key) {
                    plan.keys_to_remove.push(flag_key.clone());
                }
                continue;
            }
            let value = codec::decode_value(raw_value);
            plan.overrides_to_apply.insert(flag_key.clone(), value);
        }

        plan.should_clear_all = match clear_mode {
            ClearMode::Always => true,
            ClearMode::Auto => !entries.is_empty(),
            ClearMode::Explicit => has_sentinel,
        };

        plan
    }

    pub fn is_empty(&self) -> bool {
        !self.should_clear_all
            && self.keys_to_remove.is_empty()
            && self.overrides_to_apply.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PREFIX: &str = "ld_override_";

    fn plan(href: &str, clear_mode: ClearMode) -> LoadPlan {
        LoadPlan::from_url(&Url::parse(href).unwrap(), PREFIX, clear_mode)
    }

    #[test]
    fn test_clear_mode_matrix() {
        let with_override = "https://app.test/?ld_override_x=1";
        let with_sentinel = "https://app.test/?ld_override__clear";
        let without = "https://app.test/?other=1";

        assert!(plan(with_override, ClearMode::Always).should_clear_all);
        assert!(plan(without, ClearMode::Always).should_clear_all);

        assert!(plan(with_override, ClearMode::Auto).should_clear_all);
        assert!(plan(with_sentinel, ClearMode::Auto).should_clear_all);
        assert!(!plan(without, ClearMode::Auto).should_clear_all);

        assert!(!plan(with_override, ClearMode::Explicit).should_clear_all);
        assert!(plan(with_sentinel, ClearMode::Explicit).should_clear_all);
        assert!(!plan(without, ClearMode::Explicit).should_clear_all);
    }

    #[test]
    fn test_sentinel_is_not_an_override() {
        let plan = plan(
            "https://app.test/?ld_override__clear=1&ld_override_a=true",
            ClearMode::Explicit,
        );

        assert!(plan.should_clear_all);
        assert!(!plan.overrides_to_apply.contains_key("_clear"));
        assert_eq!(plan.overrides_to_apply.get("a"), Some(&json!(true)));
    }

    #[test]
    fn test_empty_value_means_remove() {
        let plan = plan(
            "https://app.test/?ld_override_y=&ld_override_y=&ld_override_z=%22%22",
            ClearMode::Explicit,
        );

        assert_eq!(plan.keys_to_remove, vec!["y".to_string()]);
        assert!(!plan.overrides_to_apply.contains_key("y"));
        assert_eq!(plan.overrides_to_apply.get("z"), Some(&json!("")));
    }

    #[test]
    fn test_last_occurrence_wins() {
        let plan = plan(
            "https://app.test/?ld_override_a=1&ld_override_a=2",
            ClearMode::Auto,
        );

        assert_eq!(plan.overrides_to_apply.get("a"), Some(&json!(2)));
    }

    #[test]
    fn test_empty_flag_key_ignored() {
        let plan = plan("https://app.test/?ld_override_=5", ClearMode::Explicit);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_no_namespace_params() {
        let plan = plan("https://app.test/?clientSideId=abc", ClearMode::Auto);
        assert!(plan.is_empty());
        assert_eq!(plan, LoadPlan::default());
    }
}
