//! HTML pages for cppcheck results.

use std::fmt::Write as _;

use crate::cppcheck::defect::Defect;
use crate::export::xml::escape_attr;
use crate::export::xml::escape_text as escape;

pub const STYLESHEET: &str = r#"body.body {
	font-family: Arial, sans-serif;
	font-size: 13px;
	background-color: #303030;
	margin: 0;
}

#page {
	width: 1160px;
	margin: 20px auto;
	padding: 20px;
	background-color: white;
	border: 2px solid #aaaaaa;
}

#header {
	border-bottom: thin solid #aaaaaa;
}

#menu {
	float: left;
	width: 100px;
	margin-top: 5px;
}

#menu > a {
	display: block;
	margin-left: 10px;
}

#content {
	float: left;
	width: 1020px;
	margin: 5px;
	padding: 0 10px 10px 10px;
	border-left: thin solid #aaaaaa;
}

#footer {
	clear: both;
	padding: 5px 0;
	border-top: thin solid #aaaaaa;
	font-size: 10px;
}

th, td {
	min-width: 100px;
	text-align: left;
	vertical-align: top;
}

.error {
	background-color: #ffb7b7;
}

table.source td {
	min-width: 0;
	padding: 0 6px;
	font-family: monospace;
	white-space: pre;
}

table.source td.lineno {
	color: #888888;
	text-align: right;
}

table.source tr.hll {
	background-color: #ffffcc;
}

span.defect {
	background: #ffaaaa;
	padding: 3px;
}
"#;

/// One row of the top-level index.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub component: String,
    /// Link to the component's index, relative to the top-level index.
    pub href: String,
    pub severities: Vec<String>,
}

/// A source file's defects and the page they are shown on.
#[derive(Debug, Clone)]
pub struct SourcePage<'a> {
    pub source: String,
    /// File name of the page, relative to the component index.
    pub href: String,
    pub defects: Vec<&'a Defect>,
}

fn page(title: &str, heading: &str, menu: &[(&str, &str)], content: &str) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE HTML PUBLIC \"-//W3C//DTD HTML 4.01//EN\" \"http://www.w3.org/TR/html4/strict.dtd\">\n");
    out.push_str("<html>\n<head>\n");
    let _ = writeln!(out, "\t<title>{}</title>", escape(title));
    out.push_str("\t<link href=\"style.css\" rel=\"stylesheet\" type=\"text/css\">\n");
    out.push_str("</head>\n<body class=\"body\">\n<div id=\"page\">\n");
    let _ = writeln!(out, "\t<div id=\"header\"><h1>{}</h1></div>", escape(heading));
    out.push_str("\t<div id=\"menu\">\n");
    for (label, href) in menu {
        let _ = writeln!(out, "\t\t<a href=\"{}\">{}</a>", escape_attr(href), escape(label));
    }
    out.push_str("\t</div>\n\t<div id=\"content\">\n");
    out.push_str(content);
    out.push_str("\t</div>\n");
    out.push_str("\t<div id=\"footer\">cppcheck - a tool for static C/C++ code analysis</div>\n");
    out.push_str("</div>\n</body>\n</html>\n");
    out
}

/// The top-level index: one row per component with its severities.
pub fn top_index(appname: &str, version: &str, entries: &[IndexEntry]) -> String {
    let mut table = String::from("<table>\n<tr><th>Component</th><th>Severity</th></tr>\n");
    for entry in entries {
        let class = if entry.severities.iter().any(|s| s == "error") {
            " class=\"error\""
        } else {
            ""
        };
        let _ = writeln!(
            table,
            "<tr><td><a href=\"{}\">{}</a></td><td{}>{}</td></tr>",
            escape_attr(&entry.href),
            escape(&entry.component),
            class,
            escape(&entry.severities.join(","))
        );
    }
    table.push_str("</table>\n");

    page(
        &format!("cppcheck - {}", appname),
        &format!("cppcheck report - {} {}", appname, version),
        &[("Home", "index.html")],
        &table,
    )
}

/// A component's index: every source file with its defects sorted by line.
pub fn component_index(component: &str, home: &str, pages: &[SourcePage<'_>]) -> String {
    let mut table = String::from(
        "<table>\n<tr><th>Line</th><th>Id</th><th>Severity</th><th>Message</th></tr>\n",
    );
    for page in pages {
        let _ = writeln!(
            table,
            "<tr><td colspan=\"4\"><a href=\"{}\">{}</a></td></tr>",
            escape_attr(&page.href),
            escape(&page.source)
        );
        let mut defects = page.defects.clone();
        defects.sort_by_key(|d| d.line.unwrap_or(u32::MAX));
        for d in defects {
            let line = match d.line {
                Some(line) => format!(
                    "<a href=\"{}#line-{}\">{}</a>",
                    escape_attr(&page.href),
                    line,
                    line
                ),
                None => String::new(),
            };
            let class = if d.severity == "error" { " class=\"error\"" } else { "" };
            let _ = writeln!(
                table,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td{}>{}</td></tr>",
                line,
                escape(&d.id),
                escape(&d.severity),
                class,
                escape(&d.message)
            );
        }
    }
    table.push_str("</table>\n");

    page(
        &format!("cppcheck - report - {}", component),
        &format!("cppcheck report - {}", component),
        &[("Home", home)],
        &table,
    )
}

/// A source listing with line anchors, defect lines highlighted and messages inline.
///
/// `text` is `None` when the source could not be read.
pub fn source_page(component: &str, home: &str, source: &str, text: Option<&str>, defects: &[&Defect]) -> String {
    let mut content = String::new();
    let _ = writeln!(content, "<h2>{}</h2>", escape(source));
    match text {
        None => content.push_str("<p>source not available</p>\n"),
        Some(text) => {
            content.push_str("<table class=\"source\">\n");
            for (idx, line) in text.lines().enumerate() {
                let number = idx as u32 + 1;
                let here: Vec<_> = defects.iter().filter(|d| d.line == Some(number)).collect();
                let class = if here.is_empty() { "" } else { " class=\"hll\"" };
                let _ = write!(
                    content,
                    "<tr id=\"line-{n}\"{class}><td class=\"lineno\"><a href=\"#line-{n}\">{n}</a></td><td>{code}",
                    n = number,
                    class = class,
                    code = escape(line)
                );
                for d in here {
                    let _ = write!(content, "<span class=\"defect\">&lt;--- {}</span>", escape(&d.message));
                }
                content.push_str("</td></tr>\n");
            }
            content.push_str("</table>\n");
        }
    }

    page(
        &format!("cppcheck - report - {}", component),
        &format!("cppcheck report - {}", component),
        &[("Home", home), ("Defect list", "index.html")],
        &content,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defect(line: Option<u32>, severity: &str, message: &str) -> Defect {
        Defect {
            id: "id".into(),
            severity: severity.into(),
            message: message.into(),
            verbose: String::new(),
            file: Some("a.c".into()),
            line,
        }
    }

    #[test]
    fn test_source_page_marks_lines() {
        let d = defect(Some(2), "error", "bad <thing>");
        let html = source_page("core", "../index.html", "a.c", Some("int a;\nint *p = 0;\n"), &[&d]);
        assert!(html.contains("<tr id=\"line-2\" class=\"hll\">"));
        assert!(html.contains("<tr id=\"line-1\"><td"));
        assert!(html.contains("&lt;--- bad &lt;thing&gt;"));
        assert!(html.contains("href=\"../index.html\""));
    }

    #[test]
    fn test_component_index_sorted_by_line() {
        let late = defect(Some(9), "style", "late");
        let early = defect(Some(3), "error", "early");
        let none = defect(None, "warning", "nowhere");
        let pages = vec![SourcePage {
            source: "a.c".into(),
            href: "0.html".into(),
            defects: vec![&none, &late, &early],
        }];
        let html = component_index("core", "../index.html", &pages);
        let early_at = html.find("early").unwrap();
        let late_at = html.find("late").unwrap();
        let none_at = html.find("nowhere").unwrap();
        assert!(early_at < late_at && late_at < none_at);
        assert!(html.contains("<a href=\"0.html#line-3\">3</a>"));
    }

    #[test]
    fn test_top_index_marks_errors() {
        let entries = vec![
            IndexEntry {
                component: "core".into(),
                href: "components/core/index.html".into(),
                severities: vec!["error".into(), "style".into()],
            },
            IndexEntry {
                component: "app".into(),
                href: "app/index.html".into(),
                severities: vec![],
            },
        ];
        let html = top_index("hello", "1.0.0", &entries);
        assert!(html.contains("<td class=\"error\">error,style</td>"));
        assert!(html.contains("<h1>cppcheck report - hello 1.0.0</h1>"));
        assert!(html.contains("<a href=\"app/index.html\">app</a>"));
    }
}
