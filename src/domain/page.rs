use serde::{Deserialize, Serialize};

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default = "first_page")]
    pub current_page: u32,
    #[serde(default = "first_page")]
    pub last_page: u32,
    #[serde(default)]
    pub per_page: u32,
    #[serde(default)]
    pub total: u64,
}

fn first_page() -> u32 {
    1
}

impl<T> Page<T> {
    pub fn single(data: Vec<T>) -> Self {
        let total = data.len() as u64;
        Self {
            per_page: data.len() as u32,
            data,
            current_page: 1,
            last_page: 1,
            total,
        }
    }

    pub fn empty(page: u32) -> Self {
        Self {
            data: Vec::new(),
            current_page: page,
            last_page: page.max(1),
            per_page: 0,
            total: 0,
        }
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.last_page
    }

    pub fn has_prev(&self) -> bool {
        self.current_page > 1
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::empty(1)
    }
}
