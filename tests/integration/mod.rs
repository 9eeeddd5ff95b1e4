// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod change_detection_test;
pub mod fetcher_test;
pub mod monitoring_test;
