//! 페이지네이션 계산.

use serde::{Deserialize, Serialize};

/// 기본 페이지 크기.
pub const DEFAULT_LIMIT: u32 = 10;
/// 최대 페이지 크기. 초과 시 기본값으로 되돌립니다.
pub const MAX_LIMIT: u32 = 100;

/// 정규화된 페이지 요청.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// 쿼리 파라미터에서 페이지 요청을 만듭니다.
    ///
    /// - page: 없거나 1 미만이면 1
    /// - limit: 없거나 1 미만 또는 100 초과면 10
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = match page {
            Some(p) if p >= 1 => u32::try_from(p).unwrap_or(u32::MAX),
            _ => 1,
        };
        let limit = match limit {
            Some(l) if (1..=i64::from(MAX_LIMIT)).contains(&l) => l as u32,
            _ => DEFAULT_LIMIT,
        };
        Self { page, limit }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// 건너뛸 레코드 수.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    /// 전체 건수로 응답 메타데이터를 만듭니다.
    pub fn meta(&self, total: u64) -> PageMeta {
        PageMeta::new(self.page, self.limit, total)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// 목록 응답의 페이지네이션 메타데이터.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct PageMeta {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl PageMeta {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let limit_u64 = u64::from(limit.max(1));
        Self {
            page,
            limit,
            total,
            total_pages: total.div_ceil(limit_u64),
        }
    }
}
