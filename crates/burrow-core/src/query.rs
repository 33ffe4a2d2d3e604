use typed_builder::TypedBuilder;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Column a listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    ShortCode,
    Title,
    DestinationUrl,
}

impl SortField {
    /// Parses the field names accepted on the wire.
    ///
    /// Both camelCase and snake_case spellings are accepted, including the
    /// legacy `create_at` column name.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "createdAt" | "created_at" | "create_at" => Some(SortField::CreatedAt),
            "shortCode" | "short_code" => Some(SortField::ShortCode),
            "title" => Some(SortField::Title),
            "destinationUrl" | "destination_url" => Some(SortField::DestinationUrl),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("asc") {
            Some(SortOrder::Asc)
        } else if value.eq_ignore_ascii_case("desc") {
            Some(SortOrder::Desc)
        } else {
            None
        }
    }
}

/// A page request over one owner's mappings.
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
pub struct ListQuery {
    pub owner_id: u64,
    /// 1-indexed page number.
    #[builder(default = 1)]
    pub page: u32,
    #[builder(default = DEFAULT_PAGE_SIZE)]
    pub page_size: u32,
    #[builder(default)]
    pub sort_field: SortField,
    #[builder(default)]
    pub sort_order: SortOrder,
    /// Case-insensitive substring over title, description and short code.
    #[builder(default, setter(strip_option, into))]
    pub search: Option<String>,
}

impl ListQuery {
    /// Clamps page and page size into range and drops a blank search term.
    pub fn normalized(mut self) -> Self {
        self.page = self.page.max(1);
        self.page_size = self.page_size.clamp(1, MAX_PAGE_SIZE);
        self.search = self
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self
    }

    /// Number of rows to skip before the requested page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.page_size)
    }

    /// The search term lowercased, if any.
    pub fn search_needle(&self) -> Option<String> {
        self.search.as_deref().map(str::to_lowercase)
    }
}

/// One page of results plus the size of the whole filtered set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
        }
    }

    /// `ceil(total_count / page_size)`.
    pub fn total_pages(&self, page_size: u32) -> u64 {
        if page_size == 0 {
            return 0;
        }
        self.total_count.div_ceil(u64::from(page_size))
    }
}
