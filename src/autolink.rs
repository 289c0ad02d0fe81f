//! Technology auto-linking for rendered content.
//!
//! Occurrences of technology names in text nodes become links to the
//! technology's page. The rewrite is a pure tree transform in two steps:
//! first every text node's keep-spans are computed (all candidate matches,
//! earliest start wins, overlapping later candidates dropped), then the
//! node is split around those spans.
//!
//! Text under `a`, `code`, `pre`, `h1`–`h6`, `script` and `style` is never
//! touched, so running the linker over its own output is a no-op.

use anyhow::{Context, Result};
use regex::Regex;
use std::cmp::Reverse;

use crate::markup::{Element, Node};
use crate::models::Technology;
use crate::urls::technology_path;

const EXCLUDED_TAGS: &[&str] = &[
    "a", "code", "pre", "h1", "h2", "h3", "h4", "h5", "h6", "script", "style",
];

/// A kept match inside one text node, as byte offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSpan {
    pub start: usize,
    pub end: usize,
    pub slug: String,
}

pub struct AutoLinker {
    patterns: Vec<(Regex, String)>,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Case-insensitive pattern for `name` with word boundaries on each side
/// that starts or ends with a word character. Names like "C#" or ".NET"
/// cannot use `\b` on their symbol side.
fn name_pattern(name: &str) -> Option<String> {
    let name = name.trim();
    let first = name.chars().next()?;
    let last = name.chars().next_back()?;
    let mut pattern = String::from("(?i)");
    if is_word_char(first) {
        pattern.push_str(r"\b");
    }
    pattern.push_str(&regex::escape(name));
    if is_word_char(last) {
        pattern.push_str(r"\b");
    }
    Some(pattern)
}

impl AutoLinker {
    pub fn new(technologies: &[Technology]) -> Result<Self> {
        let mut patterns = Vec::with_capacity(technologies.len());
        for tech in technologies {
            let Some(pattern) = name_pattern(&tech.name) else {
                continue;
            };
            let regex = Regex::new(&pattern)
                .with_context(|| format!("Invalid technology name pattern: {}", tech.name))?;
            patterns.push((regex, tech.slug.clone()));
        }
        Ok(Self { patterns })
    }

    /// Non-overlapping spans to link in `text`, in order.
    pub fn spans(&self, text: &str) -> Vec<LinkSpan> {
        let mut candidates: Vec<(usize, usize, usize)> = Vec::new();
        for (idx, (regex, _)) in self.patterns.iter().enumerate() {
            for m in regex.find_iter(text) {
                candidates.push((m.start(), m.end(), idx));
            }
        }
        candidates.sort_by_key(|&(start, end, idx)| (start, Reverse(end - start), idx));

        let mut kept = Vec::new();
        let mut last_end = 0;
        for (start, end, idx) in candidates {
            if start < last_end {
                continue;
            }
            last_end = end;
            kept.push(LinkSpan {
                start,
                end,
                slug: self.patterns[idx].1.clone(),
            });
        }
        kept
    }

    /// Rewrite `nodes`, returning a new tree.
    pub fn link(&self, nodes: &[Node]) -> Vec<Node> {
        if self.patterns.is_empty() {
            return nodes.to_vec();
        }
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            match node {
                Node::Text(text) => out.extend(self.link_text(text)),
                Node::Element(el) if EXCLUDED_TAGS.contains(&el.tag.as_str()) => {
                    out.push(node.clone());
                }
                Node::Element(el) => out.push(Node::Element(Element {
                    tag: el.tag.clone(),
                    attrs: el.attrs.clone(),
                    children: self.link(&el.children),
                })),
                Node::Comment(_) => out.push(node.clone()),
            }
        }
        out
    }

    fn link_text(&self, text: &str) -> Vec<Node> {
        let spans = self.spans(text);
        if spans.is_empty() {
            return vec![Node::text(text)];
        }

        let mut out = Vec::with_capacity(spans.len() * 2 + 1);
        let mut cursor = 0;
        for span in spans {
            if span.start > cursor {
                out.push(Node::text(&text[cursor..span.start]));
            }
            out.push(Node::Element(
                Element::new("a")
                    .with_attr("href", technology_path(&span.slug))
                    .with_child(Node::text(&text[span.start..span.end])),
            ));
            cursor = span.end;
        }
        if cursor < text.len() {
            out.push(Node::text(&text[cursor..]));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::{parse_fragment, render, text_content};

    fn tech(slug: &str, name: &str) -> Technology {
        Technology {
            slug: slug.into(),
            name: name.into(),
            icon: None,
            website: None,
            content: String::new(),
        }
    }

    fn linker() -> AutoLinker {
        AutoLinker::new(&[
            tech("react", "React"),
            tech("react-native", "React Native"),
            tech("nodejs", "Node.js"),
            tech("csharp", "C#"),
        ])
        .unwrap()
    }

    fn count_links(nodes: &[Node]) -> usize {
        nodes
            .iter()
            .map(|n| match n {
                Node::Element(el) if el.tag == "a" => 1 + count_links(&el.children),
                Node::Element(el) => count_links(&el.children),
                _ => 0,
            })
            .sum()
    }

    #[test]
    fn test_links_whole_words_case_insensitively() {
        let nodes = parse_fragment("<p>We love react and Reactor is not it.</p>").unwrap();
        let out = linker().link(&nodes);
        assert_eq!(
            render(&out),
            r#"<p>We love <a href="/technologies/react">react</a> and Reactor is not it.</p>"#
        );
    }

    #[test]
    fn test_overlap_keeps_single_link() {
        let nodes = vec![Node::text("We use React Native daily")];
        let out = linker().link(&nodes);
        assert_eq!(count_links(&out), 1);
        assert_eq!(out.len(), 3);
        assert_eq!(
            render(&out),
            r#"We use <a href="/technologies/react-native">React Native</a> daily"#
        );
    }

    #[test]
    fn test_earliest_match_wins() {
        let linker = AutoLinker::new(&[tech("native-script", "Native Script"), tech("react", "React Native")])
            .unwrap();
        let spans = linker.spans("React Native Script");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].slug, "react");
    }

    #[test]
    fn test_split_preserves_text() {
        let text = "React, Node.js and C# in one React app";
        let out = linker().link(&[Node::text(text)]);
        assert_eq!(text_content(&out), text);
        assert_eq!(count_links(&out), 4);
        assert!(out.len() <= 2 * 4 + 1);
    }

    #[test]
    fn test_exclusion_zones() {
        let source = "<h2>React</h2><p><code>React</code> <a href=\"/x\"><em>React</em></a></p><pre>React</pre>";
        let nodes = parse_fragment(source).unwrap();
        let out = linker().link(&nodes);
        assert_eq!(render(&out), source);
    }

    #[test]
    fn test_second_pass_is_noop() {
        let nodes = parse_fragment("<ul><li>Built with React and Node.js</li></ul>").unwrap();
        let once = linker().link(&nodes);
        let twice = linker().link(&once);
        assert_eq!(once, twice);
        assert_eq!(count_links(&twice), 2);
    }

    #[test]
    fn test_regex_metacharacters_escaped() {
        let spans = linker().spans("Nodexjs is not Node.js");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].slug, "nodejs");
        assert_eq!(spans[0].start, 15);
    }

    #[test]
    fn test_no_technologies_is_identity() {
        let linker = AutoLinker::new(&[]).unwrap();
        let nodes = vec![Node::text("React")];
        assert_eq!(linker.link(&nodes), nodes);
    }
}
