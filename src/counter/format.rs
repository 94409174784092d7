//! Display formatting for view counts

/// Suffix appended to the formatted count when rendering
pub const DEFAULT_SUFFIX: &str = " views";

/// Format a view count, switching to thousands with three decimals at 1000
///
/// ```
/// use viewcount::counter::format_views;
///
/// assert_eq!(format_views(999), "999");
/// assert_eq!(format_views(5000), "5.000k");
/// assert_eq!(format_views(6789), "6.789k");
/// ```
pub fn format_views(views: u64) -> String {
    if views >= 1000 {
        format!("{}.{:03}k", views / 1000, views % 1000)
    } else {
        views.to_string()
    }
}

/// Text written into the page, e.g. `"5.001k views"`
pub fn render_text(views: u64, suffix: &str) -> String {
    format!("{}{}", format_views(views), suffix)
}
