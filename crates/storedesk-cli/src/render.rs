//! Plain-text rendering of tables and details for the terminal.

use std::fmt::Write;

use storedesk_core::auth::SessionState;
use storedesk_core::listing::Page;
use storedesk_core::media::{MediaGallery, Preview, SubmissionPlan};
use storedesk_core::models::{status_label, Branch, Category, Order, Product, StoreInfo, User};
use storedesk_core::utils::{format_date, format_optional, format_price, truncate_string};

/// Width limit for free-text columns
const TEXT_COLUMN_WIDTH: usize = 28;

/// A table row: one cell per column.
pub trait TableRow {
    fn headers() -> &'static [&'static str];
    fn cells(&self) -> Vec<String>;
}

fn id_cell(id: Option<i64>) -> String {
    id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string())
}

impl TableRow for StoreInfo {
    fn headers() -> &'static [&'static str] {
        &["ID", "Code", "Name", "Parent", "Sort", "Status"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            id_cell(self.id),
            self.code.clone(),
            truncate_string(&self.name, TEXT_COLUMN_WIDTH),
            format_optional(&self.parent_code, "-"),
            self.sort.to_string(),
            status_label(self.status).to_string(),
        ]
    }
}

impl TableRow for Branch {
    fn headers() -> &'static [&'static str] {
        &["ID", "Name", "Country", "Status"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            id_cell(self.id),
            truncate_string(&self.name, TEXT_COLUMN_WIDTH),
            self.country.clone(),
            status_label(self.status).to_string(),
        ]
    }
}

impl TableRow for Category {
    fn headers() -> &'static [&'static str] {
        &["ID", "Name", "Shown", "Status"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            id_cell(self.id),
            truncate_string(&self.name, TEXT_COLUMN_WIDTH),
            yes_no(self.is_show).to_string(),
            status_label(self.status).to_string(),
        ]
    }
}

impl TableRow for User {
    fn headers() -> &'static [&'static str] {
        &["ID", "Name", "Username", "Email", "Role", "Status"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            id_cell(self.id),
            truncate_string(self.display_name(), TEXT_COLUMN_WIDTH),
            self.username.clone(),
            truncate_string(&self.email, TEXT_COLUMN_WIDTH),
            self.role.clone(),
            status_label(self.status).to_string(),
        ]
    }
}

impl TableRow for Product {
    fn headers() -> &'static [&'static str] {
        &["ID", "Name", "Price", "Sale", "Stock", "Active"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            id_cell(self.id),
            truncate_string(&self.name, TEXT_COLUMN_WIDTH),
            format_price(self.base_price),
            format_price(self.sale_price()),
            self.total_stock().to_string(),
            yes_no(self.active).to_string(),
        ]
    }
}

impl TableRow for Order {
    fn headers() -> &'static [&'static str] {
        &["ID", "Customer", "Phone", "Total", "Placed", "Status"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            truncate_string(&self.customer_name, TEXT_COLUMN_WIDTH),
            self.phone.clone(),
            format_price(self.total_price),
            self.created_at.as_deref().map(format_date).unwrap_or_else(|| "-".to_string()),
            self.status.display_name().to_string(),
        ]
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

/// Render a page of rows as an aligned table with a footer.
pub fn table<T: TableRow>(title: &str, page: &Page<&T>) -> String {
    let headers = T::headers();
    let rows: Vec<Vec<String>> = page.items.iter().map(|item| item.cells()).collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let _ = writeln!(out, "{}", title);

    if page.total_items == 0 {
        out.push_str("No records found\n");
        return out;
    }

    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    push_row(&mut out, &header_cells, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&mut out, &rule, &widths);
    for row in &rows {
        push_row(&mut out, row, &widths);
    }

    let _ = writeln!(
        out,
        "Page {} of {} ({} records)",
        page.page,
        page.total_pages.max(1),
        page.total_items
    );
    out
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{}{}", cell, " ".repeat(pad))
        })
        .collect();
    let _ = writeln!(out, "{}", line.join("  ").trim_end());
}

pub fn session(state: &SessionState) -> String {
    match state {
        SessionState::Unauthenticated => "Not signed in".to_string(),
        SessionState::Expired => "Session expired, sign in again".to_string(),
        SessionState::Valid(claims) => {
            let mut out = String::from("Signed in");
            if let Some(subject) = &claims.subject {
                let _ = write!(out, " as {}", subject);
            }
            let _ = write!(out, "\nExpires: {}", claims.expires_at.format("%d/%m/%Y %H:%M UTC"));
            let roles: Vec<&str> = claims.roles.iter().collect();
            let _ = write!(
                out,
                "\nRoles: {}",
                if roles.is_empty() { "-".to_string() } else { roles.join(", ") }
            );
            out
        }
    }
}

pub fn gallery(gallery: &MediaGallery, plan: &SubmissionPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "File key: {}", gallery.file_key().unwrap_or("-"));

    if gallery.is_empty() {
        out.push_str("No images\n");
    }
    for preview in gallery.previews() {
        match preview {
            Preview::Stored { index, name } => {
                let _ = writeln!(out, "  [{}] {} (stored)", index, name);
            }
            Preview::Selected { index, path } => {
                let _ = writeln!(out, "  [{}] {} (new)", index, path.display());
            }
        }
    }

    match &plan.upload {
        Some(batch) => {
            let _ = writeln!(out, "Save would upload {} file(s) under key '{}'", batch.files.len(), batch.key);
        }
        None if plan.file_key.is_none() => out.push_str("Save would clear the product's file key\n"),
        None => out.push_str("Save would keep the stored images\n"),
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use storedesk_core::listing::paginate;
    use storedesk_core::models::MediaItem;

    fn branch(id: i64, name: &str, status: i32) -> Branch {
        Branch {
            id: Some(id),
            name: name.to_string(),
            country: "VN".to_string(),
            status,
        }
    }

    #[test]
    fn test_table_aligns_columns() {
        let branches = vec![branch(1, "Ha Noi", 1), branch(22, "Ho Chi Minh City", 0)];
        let refs: Vec<&Branch> = branches.iter().collect();
        let page = paginate(refs, 1, 6);

        let out = table("Branches", &page);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Branches");
        assert!(lines[1].starts_with("ID  Name"));
        assert!(lines[3].starts_with("1   Ha Noi"));
        assert!(lines[4].ends_with("Paused"));
        assert_eq!(lines[5], "Page 1 of 1 (2 records)");
    }

    #[test]
    fn test_empty_table() {
        let page = paginate(Vec::<&Branch>::new(), 1, 6);
        assert_eq!(table("Branches", &page), "Branches\nNo records found\n");
    }

    #[test]
    fn test_session_text() {
        assert_eq!(session(&SessionState::Unauthenticated), "Not signed in");
        assert!(session(&SessionState::Expired).contains("expired"));
    }

    #[test]
    fn test_gallery_text() {
        let mut g = MediaGallery::from_stored(
            Some("k1".to_string()),
            vec![MediaItem { name: None, data: String::new() }],
        );
        g.select_files(vec![PathBuf::from("new.png")]).unwrap();
        let out = gallery(&g, &g.submission_plan());
        assert!(out.contains("[0] image_0.jpg (stored)"));
        assert!(out.contains("[1] new.png (new)"));
        assert!(out.contains("upload 1 file(s) under key 'k1'"));
    }
}
