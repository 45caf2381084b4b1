use crate::model::{StyleSheet, TargetBlockType};
use crate::style::{CssValue, StyleDeclaration};
use std::collections::HashMap;

/// Declarations resolved per block id and per table column, built once per
/// render or export. Later rules override earlier ones property by property.
#[derive(Debug, Default)]
pub struct StyleIndex {
    by_id: HashMap<String, StyleDeclaration>,
    columns: HashMap<(String, usize), StyleDeclaration>,
}

impl StyleIndex {
    pub fn build(sheet: &StyleSheet) -> Self {
        let mut index = StyleIndex::default();
        for rule in &sheet.rules {
            let column = match (rule.target.block_type, rule.target.column_index) {
                (Some(TargetBlockType::TableColumn), Some(col)) => Some(col),
                _ => None,
            };
            for id in rule.target.ids() {
                let slot = match column {
                    Some(col) => index.columns.entry((id.clone(), col)).or_default(),
                    None => index.by_id.entry(id.clone()).or_default(),
                };
                slot.merge_from(&rule.style);
            }
        }
        index
    }

    pub fn block(&self, id: &str) -> Option<&StyleDeclaration> {
        self.by_id.get(id)
    }

    pub fn column(&self, table_id: &str, col: usize) -> Option<&StyleDeclaration> {
        self.columns.get(&(table_id.to_string(), col))
    }

    pub fn column_width(&self, table_id: &str, col: usize) -> Option<&CssValue> {
        self.column(table_id, col)?.width.as_ref()
    }

    pub fn has_column_widths(&self, table_id: &str, cols: usize) -> bool {
        (0..cols).any(|c| self.column_width(table_id, c).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StyleRule;
    use crate::style::{StyleTarget, TextAlign};

    #[test]
    fn merges_rules_in_order_and_separates_columns() {
        let mut sheet = StyleSheet::default();
        sheet.rules.push(StyleRule::for_block(
            TargetBlockType::Paragraph,
            "para-1",
            StyleDeclaration {
                text_align: Some(TextAlign::Center),
                color: Some("red".into()),
                ..Default::default()
            },
        ));
        sheet.rules.push(StyleRule::for_block(
            TargetBlockType::Paragraph,
            "para-1",
            StyleDeclaration {
                color: Some("blue".into()),
                ..Default::default()
            },
        ));
        sheet.rules.push(StyleRule {
            target: StyleTarget {
                block_type: Some(TargetBlockType::TableColumn),
                block_ids: Some(vec!["table-1".into()]),
                column_index: Some(1),
                ..Default::default()
            },
            style: StyleDeclaration {
                width: Some(CssValue::Text("120".into())),
                ..Default::default()
            },
        });

        let index = StyleIndex::build(&sheet);
        let p = index.block("para-1").unwrap();
        assert_eq!(p.text_align, Some(TextAlign::Center));
        assert_eq!(p.color.as_deref(), Some("blue"));
        assert!(index.block("table-1").is_none());
        assert_eq!(
            index.column_width("table-1", 1),
            Some(&CssValue::Text("120".into()))
        );
        assert!(index.has_column_widths("table-1", 2));
        assert!(!index.has_column_widths("table-1", 1));
    }
}
