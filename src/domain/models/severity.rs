// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// 严重程度
///
/// 全序：LOW < MEDIUM < HIGH < CRITICAL
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

/// 严重程度与线上字符串、数值分数的映射表
const SEVERITY_TABLE: [(Severity, &str, u8); 4] = [
    (Severity::Low, "low", 1),
    (Severity::Medium, "medium", 2),
    (Severity::High, "high", 3),
    (Severity::Critical, "critical", 4),
];

impl Severity {
    /// 线上使用的小写字符串
    pub fn as_str(&self) -> &'static str {
        SEVERITY_TABLE
            .iter()
            .find(|(severity, _, _)| severity == self)
            .map(|(_, wire, _)| *wire)
            .unwrap_or("low")
    }

    /// 数值分数 (1-4)
    pub fn score(&self) -> u8 {
        SEVERITY_TABLE
            .iter()
            .find(|(severity, _, _)| severity == self)
            .map(|(_, _, score)| *score)
            .unwrap_or(1)
    }

    /// 解析线上字符串，大小写与首尾空白不敏感
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        SEVERITY_TABLE
            .iter()
            .find(|(_, wire, _)| wire.eq_ignore_ascii_case(value))
            .map(|(severity, _, _)| *severity)
    }

    /// 只升级不降级
    pub fn escalate_to(self, floor: Severity) -> Severity {
        self.max(floor)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::parse(s).ok_or_else(|| format!("unknown severity: {}", s))
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

/// 变更类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChangeType {
    Pricing,
    Features,
    Policy,
    Content,
    Layout,
    #[default]
    Other,
}

/// 变更类型与线上字符串的映射表
const CHANGE_TYPE_TABLE: [(ChangeType, &str); 6] = [
    (ChangeType::Pricing, "pricing"),
    (ChangeType::Features, "features"),
    (ChangeType::Policy, "policy"),
    (ChangeType::Content, "content"),
    (ChangeType::Layout, "layout"),
    (ChangeType::Other, "other"),
];

impl ChangeType {
    /// 线上使用的小写字符串
    pub fn as_str(&self) -> &'static str {
        CHANGE_TYPE_TABLE
            .iter()
            .find(|(change_type, _)| change_type == self)
            .map(|(_, wire)| *wire)
            .unwrap_or("other")
    }

    /// 解析线上字符串
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        CHANGE_TYPE_TABLE
            .iter()
            .find(|(_, wire)| wire.eq_ignore_ascii_case(value))
            .map(|(change_type, _)| *change_type)
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChangeType::parse(s).ok_or_else(|| format!("unknown change type: {}", s))
    }
}

impl Serialize for ChangeType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ChangeType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}
