//! Plain-text dump of the tree for `--print`.

use std::fmt::Write;

use crate::error::Result;
use crate::tree::{CheckState, NodeRef, TreeModel};

/// Every node regardless of expansion, one per line, outermost first
pub fn render_text(model: &TreeModel, indent_width: usize, show_counts: bool) -> Result<String> {
    let mut out = String::new();
    let mut stack: Vec<NodeRef> = vec![model.root()];
    while let Some(node) = stack.pop() {
        let indent = " ".repeat(model.depth(node)? * indent_width);
        let glyph = match model.check_state(node)? {
            CheckState::Checked => "[x]",
            CheckState::Indeterminate => "[-]",
            CheckState::Unchecked => "[ ]",
        };
        let _ = write!(out, "{}{} {}", indent, glyph, model.label(node)?);
        if show_counts {
            let _ = write!(
                out,
                "  {}/{}",
                model.selected_count(node)?,
                model.epoch_count(node)?
            );
        }
        out.push('\n');
        stack.extend(model.children(node)?.into_iter().rev());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::model::tests::make_model;

    #[test]
    fn prints_full_tree_in_order() {
        let mut model = make_model("type,protocol");
        let c = model.child_at(model.root(), 2).unwrap().unwrap();
        model.set_selected(c, false, true).unwrap();

        let text = render_text(&model, 2, true).unwrap();
        let expected = "\
[-] All epochs  5/6
  [x] A  2/2
    [x] X  1/1
    [x] Y  1/1
  [x] B  3/3
    [x] X  2/2
    [x] Y  1/1
  [ ] C  0/1
    [ ] Y  0/1
";
        assert_eq!(text, expected);
    }

    #[test]
    fn counts_can_be_hidden() {
        let model = make_model("type");
        let text = render_text(&model, 4, false).unwrap();
        assert_eq!(text.lines().nth(1), Some("    [x] A"));
    }
}
