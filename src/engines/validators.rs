// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use thiserror::Error;
use url::{Host, Url};

/// 验证错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// URL无效
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    /// 不支持的协议
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
    /// 缺少主机名
    #[error("Missing host")]
    MissingHost,
    /// 检测到SSRF攻击
    #[error("SSRF protection: {0} is not allowed")]
    SsrfDetected(String),
    /// 域名在黑名单中
    #[error("Domain {0} is in blacklist")]
    Blacklisted(String),
}

/// 检查IP地址是否安全
///
/// # 参数
///
/// * `ip` - IP地址
///
/// # 返回值
///
/// 如果IP地址是安全的则返回true，否则返回false
pub fn is_safe_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => is_safe_ipv4(ipv4),
        IpAddr::V6(ipv6) => {
            if let Some(mapped) = ipv6.to_ipv4_mapped() {
                return is_safe_ipv4(mapped);
            }
            is_safe_ipv6(ipv6)
        }
    }
}

fn is_safe_ipv4(ipv4: Ipv4Addr) -> bool {
    !ipv4.is_loopback()
        && !ipv4.is_private()
        && !ipv4.is_link_local()
        && !ipv4.is_broadcast()
        && !ipv4.is_unspecified()
}

fn is_safe_ipv6(ipv6: Ipv6Addr) -> bool {
    let first = ipv6.segments()[0];
    !ipv6.is_loopback()
        && !ipv6.is_unspecified()
        // Unique Local Address (fc00::/7)
        && (first & 0xfe00) != 0xfc00
        // Link-local (fe80::/10)
        && (first & 0xffc0) != 0xfe80
}

/// 验证URL
///
/// 只做语法层面的检查，不进行DNS解析，因此不会产生任何网络开销
///
/// # 参数
///
/// * `url` - URL字符串
/// * `allow_private_hosts` - 是否放行环回和私有地址（仅测试使用）
///
/// # 返回值
///
/// * `Ok(Url)` - 解析后的URL
/// * `Err(ValidationError)` - URL无效或存在安全风险
pub fn validate_url(url: &str, allow_private_hosts: bool) -> Result<Url, ValidationError> {
    let parsed = Url::parse(url).map_err(|e| ValidationError::InvalidUrl(e.to_string()))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ValidationError::UnsupportedScheme(parsed.scheme().to_string()));
    }

    let host = parsed.host().ok_or(ValidationError::MissingHost)?;
    if allow_private_hosts {
        return Ok(parsed);
    }

    match host {
        Host::Domain(domain) => {
            let domain = domain.trim_end_matches('.').to_ascii_lowercase();
            if domain == "localhost" || domain.ends_with(".localhost") {
                return Err(ValidationError::SsrfDetected(domain));
            }
        }
        Host::Ipv4(ip) => {
            if !is_safe_ip(IpAddr::V4(ip)) {
                return Err(ValidationError::SsrfDetected(ip.to_string()));
            }
        }
        Host::Ipv6(ip) => {
            if !is_safe_ip(IpAddr::V6(ip)) {
                return Err(ValidationError::SsrfDetected(ip.to_string()));
            }
        }
    }

    Ok(parsed)
}

/// 验证 URL 是否在黑名单域名中
///
/// 黑名单项同时覆盖其所有子域名，比较不区分大小写
pub fn validate_domain_blacklist(url: &Url, blacklist: &[String]) -> Result<(), ValidationError> {
    let host = url
        .host_str()
        .ok_or(ValidationError::MissingHost)?
        .trim_end_matches('.')
        .to_ascii_lowercase();

    for domain in blacklist {
        let domain = domain.trim().trim_end_matches('.').to_ascii_lowercase();
        if domain.is_empty() {
            continue;
        }
        if host == domain || host.ends_with(&format!(".{}", domain)) {
            return Err(ValidationError::Blacklisted(host));
        }
    }

    Ok(())
}
