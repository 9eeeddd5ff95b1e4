// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 该模块包含系统的技术实现细节，负责与外部系统的交互。
///
/// 包含的子模块：
/// - 语言模型（llm）：OpenAI 兼容接口的客户端以及快速层、深度层分析器
/// - 可观测性（observability）：指标名称与描述
///
/// 基础设施层实现领域层定义的能力特质，
/// 确保领域层保持纯粹的业务逻辑，不受技术实现的影响。
pub mod llm;
pub mod observability;
