/// Rows per page requested from `/api/data`. The backend honours any value,
/// the client always asks for this one.
pub const PAGE_SIZE: u32 = 20;

/// Active search constraints, in form order. Only non-blank, trimmed values
/// are ever stored, so nothing is sent as an empty query parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    entries: Vec<(String, String)>,
}

impl FilterSet {
    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let entries = fields
            .into_iter()
            .filter_map(|(key, value)| {
                let value = value.as_ref().trim();
                (!value.is_empty()).then(|| (key.into(), value.to_string()))
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Raw contents of the filter form before extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterForm {
    pub start_date: String,
    pub end_date: String,
    pub sku: String,
    pub product_name_like: String,
    pub supplier: String,
}

impl FilterForm {
    pub fn filters(&self) -> FilterSet {
        FilterSet::from_fields([
            ("start_date", &self.start_date),
            ("end_date", &self.end_date),
            ("sku", &self.sku),
            ("product_name_like", &self.product_name_like),
            ("supplier", &self.supplier),
        ])
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub page: u32,
    pub per_page: u32,
}

impl Default for PageCursor {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: PAGE_SIZE,
        }
    }
}

impl PageCursor {
    pub fn go_to(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }

    pub fn query(&self) -> [(&'static str, String); 2] {
        [
            ("page", self.page.to_string()),
            ("per_page", self.per_page.to_string()),
        ]
    }
}
