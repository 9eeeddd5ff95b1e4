// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 可观测性模块
///
/// 提供指标名称与描述，指标通过 `metrics` 门面上报
pub mod metrics;
