use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// 统一内存管理器，按 `scope:key` 存放一次审计运行中的中间数据
#[derive(Debug)]
pub struct Memory {
    data: HashMap<String, Value>,
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl Memory {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
        }
    }

    fn full_key(scope: &str, key: &str) -> String {
        format!("{}:{}", scope, key)
    }

    /// 存储数据到指定作用域和键，已存在时覆盖
    pub fn store<T>(&mut self, scope: &str, key: &str, data: T) -> Result<()>
    where
        T: Serialize,
    {
        let serialized = serde_json::to_value(data)?;
        self.data.insert(Self::full_key(scope, key), serialized);
        Ok(())
    }

    /// 从指定作用域和键获取数据
    pub fn get<T>(&self, scope: &str, key: &str) -> Option<T>
    where
        T: for<'a> Deserialize<'a>,
    {
        self.data
            .get(&Self::full_key(scope, key))
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// 列出指定作用域的所有键
    pub fn list_keys(&self, scope: &str) -> Vec<String> {
        let prefix = format!("{}:", scope);
        let mut keys: Vec<String> = self
            .data
            .keys()
            .filter_map(|key| key.strip_prefix(&prefix).map(str::to_string))
            .collect();
        keys.sort();
        keys
    }

    /// 清除整个作用域，返回被移除的条目数
    pub fn clear_scope(&mut self, scope: &str) -> usize {
        let prefix = format!("{}:", scope);
        let before = self.data.len();
        self.data.retain(|key, _| !key.starts_with(&prefix));
        before - self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
