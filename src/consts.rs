/// Maximum valid year (inclusive)
pub const MAX_YEAR: u16 = 9999;

/// Maximum valid month (December)
pub const MAX_MONTH: u8 = 12;

/// Month number for February
pub const FEBRUARY: u8 = 2;

/// Days in February for leap years
pub const FEBRUARY_DAYS_LEAP: u8 = 29;

/// Maximum days in each month (index 0 is unused, months are 1-indexed)
/// February shows 28 days; birthdays on the 29th are allowed separately
pub const DAYS_IN_MONTH: [u8; 13] = [
    0,  // index 0 unused (months are 1-indexed)
    31, // January
    28, // February (non-leap)
    31, // March
    30, // April
    31, // May
    30, // June
    31, // July
    31, // August
    30, // September
    31, // October
    30, // November
    31, // December
];

/// English month names (index 0 is unused, months are 1-indexed)
pub const MONTH_NAMES: [&str; 13] = [
    "",
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Storage slot holding the serialized birthday map
pub const BIRTHDAYS_KEY: &str = "birthdays";
/// Storage slot holding the serialized remote session
pub const REMOTE_AUTH_KEY: &str = "remote_auth";

/// File name prefix for exported backups
pub const BACKUP_FILE_PREFIX: &str = "birthday-backup-";
/// File extension for exported backups
pub const BACKUP_FILE_EXTENSION: &str = "json";
/// MIME type of an exported backup
pub const BACKUP_MIME_TYPE: &str = "application/json";
