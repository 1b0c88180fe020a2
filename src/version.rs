//! Jenkins 版本号比较
//!
//! 按组件比较版本号（而非字典序）：
//! - `.` 和 `-` 分隔的数字组件按数值比较，缺失的尾部组件视为 0
//! - 尾部的非数字限定符（如 `-SNAPSHOT`、`-beta-1`）低于同号正式版本，
//!   限定符之间同样按组件比较，数字组件按数值比较

use std::cmp::Ordering;
use std::fmt;

/// 解析后的版本号
///
/// 相等性与 `Ord` 一致：`2.0` 与 `2.0.0` 相等。
#[derive(Debug, Clone)]
pub struct JenkinsVersion {
    /// 数字组件
    numbers: Vec<u64>,
    /// 限定符（第一个非数字组件起的剩余部分）
    qualifier: Option<String>,
}

impl JenkinsVersion {
    /// 解析版本字符串
    ///
    /// 从第一个非纯数字组件开始，剩余部分整体作为限定符；
    /// 形如 `1rc` 的组件会拆为数字 `1` 和限定符 `rc`。
    pub fn parse(value: &str) -> Self {
        let mut numbers = Vec::new();
        let mut qualifier = None;

        let trimmed = value.trim();
        let mut rest = trimmed;
        while !rest.is_empty() {
            let end = rest.find(['.', '-']).unwrap_or(rest.len());
            let segment = &rest[..end];
            let digits: String = segment.chars().take_while(|c| c.is_ascii_digit()).collect();

            if !digits.is_empty() && digits.len() == segment.len() {
                numbers.push(digits.parse::<u64>().unwrap_or(u64::MAX));
            } else {
                if !digits.is_empty() {
                    numbers.push(digits.parse::<u64>().unwrap_or(u64::MAX));
                    qualifier = Some(rest[digits.len()..].to_string());
                } else {
                    qualifier = Some(rest.to_string());
                }
                break;
            }

            rest = rest.get(end + 1..).unwrap_or("");
        }

        let qualifier = qualifier
            .map(|q| q.trim_start_matches(['.', '-']).to_string())
            .filter(|q| !q.is_empty());

        Self { numbers, qualifier }
    }

    /// 数字组件
    pub fn numbers(&self) -> &[u64] {
        &self.numbers
    }

    /// 限定符
    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }
}

impl Ord for JenkinsVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.numbers.len().max(other.numbers.len());
        for idx in 0..len {
            let a = self.numbers.get(idx).copied().unwrap_or(0);
            let b = other.numbers.get(idx).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => {}
                other => return other,
            }
        }

        match (&self.qualifier, &other.qualifier) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => compare_qualifiers(a, b),
        }
    }
}

/// 按 `.`/`-` 分段比较限定符，纯数字段按数值比较，缺少的段排在前面
fn compare_qualifiers(left: &str, right: &str) -> Ordering {
    let mut left = left.split(['.', '-']);
    let mut right = right.split(['.', '-']);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(a), Some(b)) => {
                let ordering = match (a.parse::<u64>(), b.parse::<u64>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y),
                    _ => a.cmp(b),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

impl PartialEq for JenkinsVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for JenkinsVersion {}

impl PartialOrd for JenkinsVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for JenkinsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let numbers: Vec<String> = self.numbers.iter().map(|n| n.to_string()).collect();
        write!(f, "{}", numbers.join("."))?;
        if let Some(q) = &self.qualifier {
            write!(f, "-{}", q)?;
        }
        Ok(())
    }
}

/// 比较两个版本字符串
pub fn compare_versions(left: &str, right: &str) -> Ordering {
    JenkinsVersion::parse(left).cmp(&JenkinsVersion::parse(right))
}

/// 检查宿主版本是否满足插件的最低核心版本要求
pub fn is_core_compatible(host_version: &str, required_core: &str) -> bool {
    compare_versions(host_version, required_core) != Ordering::Less
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_release() {
        let v = JenkinsVersion::parse("2.426.1");
        assert_eq!(v.numbers(), &[2, 426, 1]);
        assert_eq!(v.qualifier(), None);
    }

    #[test]
    fn test_parse_qualifier() {
        let v = JenkinsVersion::parse("2.387-SNAPSHOT");
        assert_eq!(v.numbers(), &[2, 387]);
        assert_eq!(v.qualifier(), Some("SNAPSHOT"));

        let v = JenkinsVersion::parse("1.0-beta-1");
        assert_eq!(v.numbers(), &[1, 0]);
        assert_eq!(v.qualifier(), Some("beta-1"));

        let v = JenkinsVersion::parse("3.1rc2");
        assert_eq!(v.numbers(), &[3, 1]);
        assert_eq!(v.qualifier(), Some("rc2"));
    }

    #[test]
    fn test_numeric_not_lexical() {
        // 字典序下 "2.10" < "2.9"
        assert_eq!(compare_versions("2.10", "2.9"), Ordering::Greater);
        assert_eq!(compare_versions("2.361.4", "2.60.3"), Ordering::Greater);
    }

    #[test]
    fn test_trailing_zeros_equal() {
        assert_eq!(compare_versions("2.0", "2.0.0"), Ordering::Equal);
        assert_eq!(compare_versions("2", "2.0"), Ordering::Equal);
    }

    #[test]
    fn test_qualifier_ranks_below_release() {
        assert_eq!(compare_versions("2.0-SNAPSHOT", "2.0"), Ordering::Less);
        assert_eq!(compare_versions("2.0.1-SNAPSHOT", "2.0"), Ordering::Greater);
        assert_eq!(compare_versions("1.0-alpha", "1.0-beta"), Ordering::Less);
    }

    #[test]
    fn test_equality_matches_ordering() {
        assert_eq!(JenkinsVersion::parse("2.0"), JenkinsVersion::parse("2.0.0"));
        assert_ne!(JenkinsVersion::parse("2.0"), JenkinsVersion::parse("2.0-SNAPSHOT"));

        let set: std::collections::BTreeSet<JenkinsVersion> = ["2.0", "2.0.0", "2"]
            .iter()
            .map(|v| JenkinsVersion::parse(v))
            .collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_qualifier_numeric_segments() {
        assert_eq!(compare_versions("1.0-beta-10", "1.0-beta-9"), Ordering::Greater);
        assert_eq!(compare_versions("1.0-rc.2", "1.0-rc.11"), Ordering::Less);
        assert_eq!(compare_versions("1.0-beta", "1.0-beta-1"), Ordering::Less);
        assert_eq!(compare_versions("1.0-beta-01", "1.0-beta-1"), Ordering::Equal);
    }

    #[test]
    fn test_is_core_compatible() {
        assert!(is_core_compatible("2.0", "2.0"));
        assert!(is_core_compatible("2.426.1", "2.361"));
        assert!(!is_core_compatible("2.0", "3.0"));
        assert!(!is_core_compatible("2.60", "2.60.1"));
    }

    #[test]
    fn test_display() {
        assert_eq!(JenkinsVersion::parse("2.426.1").to_string(), "2.426.1");
        assert_eq!(JenkinsVersion::parse("1.0-beta-1").to_string(), "1.0-beta-1");
    }
}
