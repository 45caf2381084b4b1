//! Splits an imported block sequence into a chapter hierarchy at headings.

use super::body::OwnedRule;
use crate::model::{Block, Content, StyleScope, StyleSheet};
use crate::settings::ImportConfig;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One chapter of an imported document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterData {
    pub id: String,
    pub title: String,
    /// Level of the heading that opened the chapter.
    pub level: u8,
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Position among the chapters sharing `parent_id`.
    #[serde(default)]
    pub order_index: usize,
    pub content: Content,
    #[serde(default)]
    pub stylesheet: StyleSheet,
}

struct Pending {
    title: String,
    level: u8,
    blocks: Vec<Block>,
}

pub struct ChapterBuilder<'c> {
    config: &'c ImportConfig,
    rules: Vec<OwnedRule>,
    chapters: Vec<ChapterData>,
    /// Open chapters as (level, id), outermost first.
    stack: Vec<(u8, String)>,
}

impl<'c> ChapterBuilder<'c> {
    pub fn new(config: &'c ImportConfig, rules: Vec<OwnedRule>) -> Self {
        ChapterBuilder {
            config,
            rules,
            chapters: Vec::new(),
            stack: Vec::new(),
        }
    }

    fn is_chapter_heading(&self, block: &Block) -> Option<(String, u8)> {
        match block {
            Block::Heading(h) if h.level <= self.config.max_heading_level => {
                Some((h.text.clone(), h.level))
            }
            _ => None,
        }
    }

    pub fn build(mut self, blocks: Vec<Block>) -> Vec<ChapterData> {
        let mut current: Option<Pending> = None;
        let mut preamble: Vec<Block> = Vec::new();

        for block in blocks {
            if let Some((title, level)) = self.is_chapter_heading(&block) {
                match current.take() {
                    Some(done) => self.close(done),
                    None if !preamble.is_empty() => {
                        let blocks = std::mem::take(&mut preamble);
                        self.close(Pending {
                            title: self.config.default_chapter_title.clone(),
                            level: 1,
                            blocks,
                        });
                    }
                    None => {}
                }
                current = Some(Pending {
                    title,
                    level,
                    blocks: Vec::new(),
                });
                continue;
            }
            match current.as_mut() {
                Some(pending) => pending.blocks.push(block),
                None => preamble.push(block),
            }
        }

        match current {
            Some(done) => self.close(done),
            None => self.close(Pending {
                title: self.config.default_chapter_title.clone(),
                level: 1,
                blocks: preamble,
            }),
        }
        renumber(&mut self.chapters);
        self.chapters
    }

    fn close(&mut self, pending: Pending) {
        let id = uuid::Uuid::new_v4().to_string();
        while self
            .stack
            .last()
            .is_some_and(|(level, _)| *level >= pending.level)
        {
            self.stack.pop();
        }
        let parent_id = self.stack.last().map(|(_, id)| id.clone());
        self.stack.push((pending.level, id.clone()));

        let owned: HashSet<&str> = pending.blocks.iter().map(Block::id).collect();
        let mut stylesheet = StyleSheet::new(format!("style-{}", &id[..8]), StyleScope::Chapter);
        stylesheet.rules = self
            .rules
            .iter()
            .filter(|r| owned.contains(r.owner.as_str()))
            .map(|r| r.rule.clone())
            .collect();

        self.chapters.push(ChapterData {
            id,
            title: pending.title,
            level: pending.level,
            parent_id,
            order_index: 0,
            content: Content::new(pending.blocks),
            stylesheet,
        });
    }
}

fn renumber(chapters: &mut [ChapterData]) {
    let mut next: HashMap<Option<String>, usize> = HashMap::new();
    for chapter in chapters {
        let slot = next.entry(chapter.parent_id.clone()).or_default();
        chapter.order_index = *slot;
        *slot += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HeadingBlock, ParagraphBlock, StyleDeclaration, StyleRule, TargetBlockType};

    fn heading(id: &str, level: u8) -> Block {
        Block::Heading(HeadingBlock {
            id: id.into(),
            text: format!("title {id}"),
            level,
            marks: vec![],
            attrs: None,
        })
    }

    fn para(id: &str) -> Block {
        Block::Paragraph(ParagraphBlock {
            id: id.into(),
            text: id.into(),
            marks: vec![],
            attrs: None,
        })
    }

    fn config(max: u8) -> ImportConfig {
        ImportConfig::new(max, "默认章节").unwrap()
    }

    #[test]
    fn preamble_becomes_default_chapter() {
        let cfg = config(2);
        let chapters =
            ChapterBuilder::new(&cfg, vec![]).build(vec![para("p0"), heading("h1", 1), para("p1")]);
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].title, "默认章节");
        assert_eq!(chapters[0].level, 1);
        assert_eq!(chapters[0].content.blocks.len(), 1);
        assert_eq!(chapters[1].title, "title h1");
        assert_eq!(chapters[1].content.blocks, vec![para("p1")]);
        assert_eq!(chapters[1].parent_id, None);
        assert_eq!(chapters[1].order_index, 1);
    }

    #[test]
    fn empty_document_gets_one_empty_chapter() {
        let cfg = config(2);
        let chapters = ChapterBuilder::new(&cfg, vec![]).build(vec![]);
        assert_eq!(chapters.len(), 1);
        assert!(chapters[0].content.blocks.is_empty());
        assert_eq!(chapters[0].stylesheet.applies_to, StyleScope::Chapter);
        assert!(chapters[0].stylesheet.style_id.starts_with("style-"));
    }

    #[test]
    fn stack_assigns_parents_and_sibling_order() {
        let cfg = config(3);
        let chapters = ChapterBuilder::new(&cfg, vec![]).build(vec![
            heading("a", 1),
            heading("a1", 2),
            heading("a1x", 3),
            heading("a2", 2),
            heading("deep", 4),
            heading("b", 1),
            heading("b1", 3),
        ]);
        let titles: Vec<_> = chapters.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(
            titles,
            ["title a", "title a1", "title a1x", "title a2", "title b", "title b1"]
        );
        let id = |i: usize| Some(chapters[i].id.clone());
        assert_eq!(chapters[0].parent_id, None);
        assert_eq!(chapters[1].parent_id, id(0));
        assert_eq!(chapters[2].parent_id, id(1));
        assert_eq!(chapters[3].parent_id, id(0));
        assert_eq!(chapters[4].parent_id, None);
        assert_eq!(chapters[5].parent_id, id(4));
        // level 4 stays a heading inside a2
        assert_eq!(chapters[3].content.blocks, vec![heading("deep", 4)]);

        let order: Vec<_> = chapters.iter().map(|c| c.order_index).collect();
        assert_eq!(order, [0, 0, 0, 1, 1, 0]);
        for c in &chapters {
            if let Some(pid) = &c.parent_id {
                let parent = chapters.iter().find(|p| &p.id == pid).unwrap();
                assert!(parent.level < c.level);
            }
        }
    }

    #[test]
    fn rules_follow_their_blocks() {
        let cfg = config(1);
        let rule = |owner: &str| OwnedRule {
            owner: owner.into(),
            rule: StyleRule::for_block(
                TargetBlockType::Paragraph,
                owner,
                StyleDeclaration {
                    color: Some("#112233".into()),
                    ..Default::default()
                },
            ),
        };
        let chapters = ChapterBuilder::new(&cfg, vec![rule("p1"), rule("p2"), rule("h2")]).build(
            vec![heading("h1", 1), para("p1"), heading("h2", 1), para("p2")],
        );
        assert_eq!(chapters[0].stylesheet.rules, vec![rule("p1").rule]);
        assert_eq!(chapters[1].stylesheet.rules, vec![rule("p2").rule]);
    }
}
