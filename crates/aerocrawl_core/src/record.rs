use url::Url;

/// One top-level catalog grouping, resolved from the site index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub entry_url: Url,
}

/// One page of a paginated listing within a category.
///
/// Ordinals start at 1 and form a contiguous run per category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRef {
    pub ordinal: u32,
    pub url: String,
}

/// Row-level data scraped from a listing page, before the detail fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordStub {
    pub category: String,
    pub subregion: String,
    pub name: String,
    pub detail_url: Url,
    pub short_code: String,
    pub long_code: String,
}

impl RecordStub {
    /// Free-text address used for coordinate lookup: `category,subregion,name`.
    pub fn address_query(&self) -> String {
        format!("{},{},{}", self.category, self.subregion, self.name)
    }
}

/// Fields extracted from a detail page.
///
/// `description` may be empty; `contact_phone` is always present (its absence
/// fails the record before this struct is built).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailFields {
    pub contact_phone: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinates {
    pub latitude: String,
    pub longitude: String,
}

/// A fully enriched output row. Immutable once constructed; this is the unit
/// that crosses the harvester/persister boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    stub: RecordStub,
    detail: DetailFields,
    coordinates: Option<Coordinates>,
}

impl Record {
    pub fn new(stub: RecordStub, detail: DetailFields, coordinates: Option<Coordinates>) -> Self {
        Self {
            stub,
            detail,
            coordinates,
        }
    }

    /// The output section this record belongs to.
    pub fn category(&self) -> &str {
        &self.stub.category
    }

    pub fn stub(&self) -> &RecordStub {
        &self.stub
    }

    pub fn detail(&self) -> &DetailFields {
        &self.detail
    }

    pub fn coordinates(&self) -> Option<&Coordinates> {
        self.coordinates.as_ref()
    }

    /// Flattens the record into a sheet row. Column order: subregion, name,
    /// detail URL, short code, long code, phone, description, then latitude
    /// and longitude when `with_coordinates` is set (empty strings if the
    /// lookup was skipped or failed).
    pub fn into_row(self, with_coordinates: bool) -> Vec<String> {
        let mut row = vec![
            self.stub.subregion,
            self.stub.name,
            self.stub.detail_url.to_string(),
            self.stub.short_code,
            self.stub.long_code,
            self.detail.contact_phone,
            self.detail.description,
        ];
        if with_coordinates {
            match self.coordinates {
                Some(coords) => {
                    row.push(coords.latitude);
                    row.push(coords.longitude);
                }
                None => {
                    row.push(String::new());
                    row.push(String::new());
                }
            }
        }
        row
    }
}
