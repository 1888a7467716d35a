// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::trigger::{LexiconRecord, MatchPolicy, PatternRecord};

/// 配置文件路径覆盖（环境变量）
pub const CONFIG_PATH_ENV: &str = "MEMORY_TRIGGER_CONFIG";

/// 触发词配置
///
/// 配置文件示例：
/// ```json
/// {
///   "patterns": [
///     { "id": "remember", "raw": "记住", "weight": 2.0 },
///     { "id": "greet", "phonetic": { "text": "你好" } },
///     { "id": "bank", "phonetic": { "syllables": ["yin2", "hang2"] } }
///   ],
///   "policy": { "tone": "toneless" },
///   "lexicon": [{ "word": "重庆", "readings": "chong2 qing4" }]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TriggerConfig {
    /// 触发词列表
    #[serde(default)]
    pub patterns: Vec<PatternRecord>,
    /// 匹配策略
    #[serde(default)]
    pub policy: MatchPolicy,
    /// 附加词库（覆盖内置词条）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lexicon: Vec<LexiconRecord>,
}

impl TriggerConfig {
    /// 默认配置路径
    ///
    /// 优先使用环境变量 `MEMORY_TRIGGER_CONFIG`，否则为系统配置目录下的
    /// `MemoryTrigger/triggers.json`
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            if !path.trim().is_empty() {
                return Ok(PathBuf::from(path));
            }
        }
        let config_dir = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("无法获取配置目录"))?;
        Ok(config_dir.join("MemoryTrigger").join("triggers.json"))
    }

    /// 从默认路径加载，文件不存在时返回空配置
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            tracing::info!("配置文件不存在，使用空触发词集合: {:?}", path);
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// 从指定路径加载
    pub fn load_from(path: &Path) -> Result<Self> {
        tracing::info!("尝试从以下路径加载触发词配置: {:?}", path);
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {:?}", path))?;
        let config = Self::from_json_str(&content)
            .with_context(|| format!("配置文件格式错误: {:?}", path))?;
        tracing::info!(
            "已加载 {} 个触发词, {} 个附加词条",
            config.patterns.len(),
            config.lexicon.len()
        );
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("解析触发词配置失败")
    }

    /// 保存到指定路径（先写临时文件，再重命名替换）
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(self)?;
        let temp_path = path.with_extension("json.tmp");

        std::fs::write(&temp_path, &content).map_err(|e| {
            tracing::error!("写入临时文件失败: {}", e);
            e
        })?;

        if let Err(e) = std::fs::rename(&temp_path, path) {
            tracing::error!("重命名临时文件失败: {}", e);
            let _ = std::fs::remove_file(&temp_path);
            return Err(e.into());
        }

        tracing::info!("触发词配置已保存: {:?}", path);
        Ok(())
    }

    /// 配置指纹（规范 JSON 的 SHA-256）
    ///
    /// 内容相同的配置指纹相同，重新加载时据此跳过无变化的配置
    pub fn fingerprint(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        format!("{:x}", Sha256::digest(&bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trigger::{PhoneticForm, TonePolicy};

    fn sample() -> TriggerConfig {
        TriggerConfig {
            patterns: vec![
                PatternRecord::raw("remember", "记住").with_weight(2.0),
                PatternRecord::phonetic_text("greet", "你好"),
                PatternRecord::raw("bank", "银行").with_phonetic(PhoneticForm::Syllables(vec![
                    "yin2".to_string(),
                    "hang2".to_string(),
                ])),
            ],
            policy: MatchPolicy {
                tone: TonePolicy::Toneless,
                derive_phonetic_from_raw: true,
            },
            lexicon: vec![LexiconRecord {
                word: "重庆".to_string(),
                readings: "chong2 qing4".to_string(),
            }],
        }
    }

    #[test]
    fn test_parse_minimal() {
        let config = TriggerConfig::from_json_str(r#"{"patterns":[{"id":"a","raw":"记住"}]}"#).unwrap();
        assert_eq!(config.patterns.len(), 1);
        assert_eq!(config.patterns[0].weight, 1.0);
        assert!(!config.patterns[0].case_sensitive);
        assert_eq!(config.policy, MatchPolicy::default());
        assert!(config.lexicon.is_empty());
    }

    #[test]
    fn test_parse_full() {
        let json = r#"{
            "patterns": [
                {"id": "greet", "phonetic": {"text": "你好"}},
                {"id": "bank", "phonetic": {"syllables": ["yin2", "hang2"]}, "case_sensitive": true}
            ],
            "policy": {"tone": "toneless"},
            "lexicon": [{"word": "重庆", "readings": "chong2 qing4"}]
        }"#;
        let config = TriggerConfig::from_json_str(json).unwrap();
        assert_eq!(config.policy.tone, TonePolicy::Toneless);
        assert_eq!(
            config.patterns[0].phonetic,
            Some(PhoneticForm::Text("你好".to_string()))
        );
        assert!(config.patterns[1].case_sensitive);
        assert_eq!(config.lexicon[0].word, "重庆");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(TriggerConfig::from_json_str("{").is_err());
        assert!(TriggerConfig::from_json_str(r#"{"policy":{"tone":"loud"}}"#).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("triggers.json");

        let config = sample();
        config.save_to(&path).unwrap();
        assert!(!path.with_extension("json.tmp").exists());

        let loaded = TriggerConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.fingerprint(), config.fingerprint());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(TriggerConfig::load_from(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_fingerprint() {
        let a = sample();
        let mut b = sample();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);

        b.patterns[0].weight = 3.0;
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
