//! cppcheck's XML (version 2) output.

use crate::export::xml::{self, Element, XmlError};

const REPORT_HEADER: &[&str] = &[r#"<?xml version="1.0" encoding="utf-8"?>"#];

/// One reported problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defect {
    pub id: String,
    pub severity: String,
    pub message: String,
    pub verbose: String,
    /// File of the last reported location, as cppcheck printed it.
    pub file: Option<String>,
    /// 1-based line of the last reported location.
    pub line: Option<u32>,
}

impl Defect {
    pub fn is_problem(&self) -> bool {
        self.severity != "information"
    }
}

fn collect<'a>(el: &'a Element, name: &str, out: &mut Vec<&'a Element>) {
    for child in el.elements() {
        if child.name == name {
            out.push(child);
        }
        collect(child, name, out);
    }
}

/// Parse the defects out of cppcheck's stderr.
pub fn parse_defects(text: &str) -> Result<Vec<Defect>, XmlError> {
    let root = xml::parse(text)?;
    let mut errors = Vec::new();
    collect(&root, "error", &mut errors);

    let defects = errors
        .into_iter()
        .map(|error| {
            let attr = |key: &str| error.attr(key).unwrap_or_default().to_string();
            let mut defect = Defect {
                id: attr("id"),
                severity: attr("severity"),
                message: attr("msg"),
                verbose: attr("verbose"),
                file: None,
                line: None,
            };
            for location in error.children_named("location") {
                defect.file = location.attr("file").map(str::to_string);
                defect.line = location.attr("line").and_then(|l| l.parse().ok());
            }
            defect
        })
        .collect();
    Ok(defects)
}

/// The XML report kept next to the HTML pages: cppcheck's output plus the command that produced it.
pub fn xml_report(text: &str, command: &str) -> Result<String, XmlError> {
    let mut root = xml::parse(text)?;
    root.child_or_insert("cppcheck")
        .push(Element::new("cmd").with_text(command));
    Ok(xml::to_string(REPORT_HEADER, &root))
}

#[cfg(test)]
pub(crate) const SAMPLE_OUTPUT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<results version="2">
    <cppcheck version="2.13"/>
    <errors>
        <error id="nullPointer" severity="error" msg="Null pointer dereference: p" verbose="Null pointer dereference: p">
            <location file="components/libcore/a.c" line="7" column="5"/>
            <location file="components/libcore/a.c" line="9" column="5"/>
        </error>
        <error id="unusedVariable" severity="style" msg="Unused variable: x &lt;int&gt;" verbose="Unused variable: x">
            <location file="components/libcore/b.c" line="3"/>
        </error>
        <error id="missingIncludeSystem" severity="information" msg="Include file not found" verbose="Include file not found"/>
    </errors>
</results>
"#;
