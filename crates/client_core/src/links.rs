//! Parsing of the cursor-based `Link` pagination header, e.g.
//!
//! ```text
//! <https://host/api/0/...?cursor=0:0:1>; rel="previous"; results="false"; cursor="0:0:1",
//! <https://host/api/0/...?cursor=0:100:0>; rel="next"; results="true"; cursor="0:100:0"
//! ```

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    pub url: String,
    pub cursor: Option<String>,
    pub results: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLinks {
    pub previous: Option<PageLink>,
    pub next: Option<PageLink>,
}

impl PageLinks {
    /// Unknown relations and malformed entries are skipped.
    pub fn parse(header: &str) -> Self {
        let mut links = Self::default();
        for entry in header.split(',') {
            let Some((rel, link)) = parse_entry(entry) else {
                continue;
            };
            match rel.as_str() {
                "previous" => links.previous = Some(link),
                "next" => links.next = Some(link),
                _ => {}
            }
        }
        links
    }

    pub fn has_next(&self) -> bool {
        self.next.as_ref().is_some_and(|link| link.results)
    }

    pub fn has_previous(&self) -> bool {
        self.previous.as_ref().is_some_and(|link| link.results)
    }
}

fn parse_entry(entry: &str) -> Option<(String, PageLink)> {
    let mut parts = entry.split(';');
    let url = parts
        .next()?
        .trim()
        .strip_prefix('<')?
        .strip_suffix('>')?
        .to_string();

    let mut rel = None;
    let mut cursor = None;
    let mut results = false;
    for param in parts {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"');
        match key.trim() {
            "rel" => rel = Some(value.to_string()),
            "cursor" => cursor = Some(value.to_string()),
            "results" => results = value == "true",
            _ => {}
        }
    }

    Some((
        rel?,
        PageLink {
            url,
            cursor,
            results,
        },
    ))
}
