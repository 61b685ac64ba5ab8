use std::collections::HashMap;

/// 员工代码解析结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaffResolution {
    Known(i64),
    /// 就诊块中没有员工代码
    Absent,
    /// 代码不在对照表中, 就诊照常导入但不归属员工
    Unknown,
}

impl StaffResolution {
    pub fn staff_id(self) -> Option<i64> {
        match self {
            StaffResolution::Known(id) => Some(id),
            _ => None,
        }
    }
}

/// 固定的员工代码对照表
#[derive(Debug, Clone, Default)]
pub struct StaffDirectory {
    codes: HashMap<String, i64>,
}

impl StaffDirectory {
    pub fn new(codes: HashMap<String, i64>) -> Self {
        // 环境变量来源的键会被小写化, 统一转大写
        let codes = codes
            .into_iter()
            .map(|(code, id)| (code.trim().to_uppercase(), id))
            .collect();
        Self { codes }
    }

    pub fn resolve(&self, code: &str) -> StaffResolution {
        let code = code.trim();
        if code.is_empty() {
            return StaffResolution::Absent;
        }
        match self.codes.get(&code.to_uppercase()) {
            Some(&id) => StaffResolution::Known(id),
            None => StaffResolution::Unknown,
        }
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl FromIterator<(String, i64)> for StaffDirectory {
    fn from_iter<I: IntoIterator<Item = (String, i64)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> StaffDirectory {
        [("HL".to_string(), 3), ("jt".to_string(), 7)].into_iter().collect()
    }

    #[test]
    fn known_codes() {
        let staff = directory();
        assert_eq!(staff.resolve("HL"), StaffResolution::Known(3));
        assert_eq!(staff.resolve("JT"), StaffResolution::Known(7));
        assert_eq!(staff.len(), 2);
    }

    #[test]
    fn unknown_and_absent_codes() {
        let staff = directory();
        assert_eq!(staff.resolve("ZZ"), StaffResolution::Unknown);
        assert_eq!(staff.resolve(""), StaffResolution::Absent);
        assert_eq!(staff.resolve("ZZ").staff_id(), None);
    }
}
