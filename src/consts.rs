/// Number of days in a week
pub const DAYS_PER_WEEK: u32 = 7;

/// Highest weekday number (Saturday, with Sunday = 0)
pub const MAX_DAY_OF_WEEK: u8 = 6;

/// First day of month, used for lower bounds
pub const MIN_DAY_OF_MONTH: u8 = 1;

/// Highest day-of-month any month can have
pub const MAX_DAY_OF_MONTH: u8 = 31;

/// Months in a year, used by yearly advances
pub const MONTHS_PER_YEAR: u32 = 12;

/// Maximum valid month (December)
pub const MAX_MONTH: u32 = 12;

/// Advance steps allowed while skipping occurrences before a window
pub const FAST_FORWARD_LIMIT: usize = 2000;

/// Occurrences examined per window
pub const COLLECT_LIMIT: usize = 100;

/// Candidate months a day-of-month rule may scan before giving up and
/// saturating at the last representable date
pub const MONTH_SEARCH_LIMIT: u32 = 120;

/// Separator between window start and end (ISO 8601 interval form)
pub const WINDOW_SEPARATOR: char = '/';

/// Separator for free-text day lists (`"1, 15, 31"`)
pub const DAY_LIST_SEPARATOR: char = ',';
