// ==========================================
// 危废桶监控系统 - 产废企业
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 产废企业 (容器归属方)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub company_id: String,
    pub name: String,
    pub cnpj: String, // 税号, 唯一
    pub city: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Company {
    pub fn new(company_id: &str, name: &str, cnpj: &str) -> Self {
        Self {
            company_id: company_id.to_string(),
            name: name.to_string(),
            cnpj: cnpj.to_string(),
            city: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}
