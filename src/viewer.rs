//! Self-contained HTML viewer for an [`ExtractionOutput`].
//!
//! The page lists every titled table under a `📄 Page N: Title` heading with
//! a CSV download link, followed by the cropped images. By default tables
//! and images are embedded as `data:` URIs so the HTML works on its own;
//! [`crate::extract::extract_to_dir`] points the links at the files it
//! writes next to `index.html` instead.

use crate::error::ExtractError;
use crate::frame::{self, DataFrame};
use crate::output::ExtractionOutput;
use crate::pipeline::encode::data_uri;
use std::fmt::Write as _;

const STYLE: &str = r#"
body { font-family: "Source Sans Pro", system-ui, sans-serif; margin: 0; color: #31333f; }
main { max-width: none; padding: 2rem 3rem; }
h1 { font-size: 2.25rem; margin-bottom: 1.5rem; }
h3 { margin-top: 2rem; }
.frame { overflow-x: auto; border: 1px solid #e6e9ef; border-radius: 4px; }
table { border-collapse: collapse; width: 100%; font-size: 0.875rem; }
th, td { border: 1px solid #e6e9ef; padding: 0.25rem 0.5rem; text-align: left; vertical-align: top; }
th { background: #f0f2f6; }
.download { display: inline-block; margin: 0.75rem 0; padding: 0.375rem 0.75rem; border: 1px solid #d3d6de; border-radius: 0.5rem; color: inherit; text-decoration: none; }
.download:hover { border-color: #ff4b4b; color: #ff4b4b; }
.warning { background: #fffce7; color: #926c05; padding: 1rem; border-radius: 0.5rem; margin: 1rem 0; }
.image img { width: 100%; height: auto; }
form.upload { border: 1px dashed #d3d6de; border-radius: 0.5rem; padding: 1rem; margin-bottom: 2rem; }
"#;

/// Page chrome and asset placement for [`render_html`].
#[derive(Debug, Clone)]
pub struct ViewerOptions {
    /// Browser tab title.
    pub page_title: String,
    /// Main heading.
    pub heading: String,
    /// When set, an upload form posting to this URL is shown above the results.
    pub upload_action: Option<String>,
    /// CSV link targets, one per table. `None` embeds the CSV as a data-URI.
    pub csv_hrefs: Option<Vec<String>>,
    /// Image sources, one per image. `None` embeds the PNG as a data-URI.
    pub image_srcs: Option<Vec<String>>,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            page_title: "Datasheet Extractor".into(),
            heading: "DATASHEET INFORMATION".into(),
            upload_action: None,
            csv_hrefs: None,
            image_srcs: None,
        }
    }
}

/// Escape text for HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Cell text with embedded newlines kept as line breaks.
fn cell_html(text: &str) -> String {
    escape_html(text).replace('\n', "<br>")
}

fn open_page(out: &mut String, options: &ViewerOptions) {
    let _ = write!(
        out,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n\
         <link rel=\"icon\" href=\"data:image/svg+xml,<svg xmlns=%22http://www.w3.org/2000/svg%22 viewBox=%220 0 100 100%22><text y=%22.9em%22 font-size=%2290%22>📄</text></svg>\">\n\
         <style>{}</style>\n</head>\n<body>\n<main>\n<h1>{}</h1>\n",
        escape_html(&options.page_title),
        STYLE,
        escape_html(&options.heading)
    );
    if let Some(ref action) = options.upload_action {
        let _ = write!(
            out,
            "<form class=\"upload\" method=\"post\" action=\"{}\" enctype=\"multipart/form-data\">\n\
             <label for=\"file\">Upload component datasheet (PDF)</label><br>\n\
             <input type=\"file\" id=\"file\" name=\"file\" accept=\".pdf,application/pdf\" required>\n\
             <button type=\"submit\">Extract</button>\n</form>\n",
            escape_html(action)
        );
    }
}

fn close_page(out: &mut String) {
    out.push_str("</main>\n</body>\n</html>\n");
}

fn warning(out: &mut String, message: &str) {
    let _ = writeln!(out, "<div class=\"warning\">⚠️ {}</div>", escape_html(message));
}

/// The upload form on its own, shown before any file has been submitted.
pub fn render_upload_page(options: &ViewerOptions) -> String {
    let mut out = String::new();
    open_page(&mut out, options);
    close_page(&mut out);
    out
}

/// Render the full results page.
pub fn render_html(output: &ExtractionOutput, options: &ViewerOptions) -> Result<String, ExtractError> {
    let mut out = String::new();
    open_page(&mut out, options);

    // ── Tables ───────────────────────────────────────────────────────────
    if output.tables.is_empty() {
        warning(
            &mut out,
            &format!("No titled tables found from page {} onwards.", output.start_page),
        );
    }
    for (idx, table) in output.tables.iter().enumerate() {
        let title = frame::display_title(table, idx);
        let _ = writeln!(
            out,
            "<h3>📄 Page {}: {}</h3>",
            table.page,
            escape_html(&title)
        );

        let df = DataFrame::from_table(table);
        out.push_str("<div class=\"frame\"><table>\n<thead><tr>");
        for col in &df.columns {
            let _ = write!(out, "<th>{}</th>", cell_html(col));
        }
        out.push_str("</tr></thead>\n<tbody>\n");
        for row in &df.rows {
            out.push_str("<tr>");
            for cell in row {
                let _ = write!(out, "<td>{}</td>", cell_html(cell));
            }
            out.push_str("</tr>\n");
        }
        out.push_str("</tbody>\n</table></div>\n");

        let href = match options.csv_hrefs.as_ref().and_then(|h| h.get(idx)) {
            Some(href) => href.clone(),
            None => data_uri("text/csv", frame::table_csv(table)?.as_bytes()),
        };
        let _ = writeln!(
            out,
            "<a class=\"download\" id=\"download_btn_{}\" href=\"{}\" download=\"{}\" type=\"text/csv\">Download '{}' as CSV</a>",
            idx,
            escape_html(&href),
            escape_html(&frame::table_file_name(table, idx)),
            escape_html(&title)
        );
    }

    // ── Images ───────────────────────────────────────────────────────────
    if output.images.is_empty() {
        warning(
            &mut out,
            &format!("No images found from page {} onwards.", output.start_page),
        );
    } else {
        out.push_str("<h2>🖼 Extracted Images &amp; Graphs</h2>\n");
        for (idx, image) in output.images.iter().enumerate() {
            let src = match options.image_srcs.as_ref().and_then(|s| s.get(idx)) {
                Some(src) => src.clone(),
                None => data_uri("image/png", &image.png),
            };
            let _ = writeln!(
                out,
                "<div class=\"image\"><p><strong>Page {}</strong></p><img src=\"{}\" alt=\"Image {} on page {}\" width=\"{}\" height=\"{}\"></div>",
                image.page,
                escape_html(&src),
                image.index + 1,
                image.page,
                image.width,
                image.height
            );
        }
    }

    close_page(&mut out);
    Ok(out)
}
