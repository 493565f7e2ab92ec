//! End-to-end tests for the backtracking memoized parser.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use pretty_assertions::assert_eq;

use sable_lexer::{Lexer, Lexicon};

use crate::{Grammar, Parser, SyntaxError, SyntaxTree};

fn letters_lexicon() -> Arc<Lexicon> {
    let mut builder = Lexicon::builder();
    for letter in ["a", "b", "c", "p", "q", "r", "x"] {
        builder
            .add_type(letter, letter, &format!("the letter {letter}"), false)
            .unwrap();
    }
    builder.add_type("ws", r"[ \t\n]+", "whitespace", true).unwrap();
    Arc::new(builder.build())
}

fn math_lexicon() -> Arc<Lexicon> {
    let mut builder = Lexicon::builder();
    builder.add_type("int", "[0-9]+", "integer literal", false).unwrap();
    builder.add_type("plus", r"\+", "plus operator", false).unwrap();
    builder.add_type("ws", r"[ \t\n]+", "whitespace", true).unwrap();
    Arc::new(builder.build())
}

fn parse(
    grammar: &Grammar,
    lexicon: &Arc<Lexicon>,
    source: &str,
) -> Result<SyntaxTree, SyntaxError> {
    let mut lexer = Lexer::new(Arc::clone(lexicon), source);
    Parser::new(grammar).parse(&mut lexer)
}

fn parse_with_capacity(
    grammar: &Grammar,
    lexicon: &Arc<Lexicon>,
    source: &str,
    capacity: usize,
) -> Result<SyntaxTree, SyntaxError> {
    let mut lexer = Lexer::new(Arc::clone(lexicon), source);
    Parser::new(grammar)
        .with_cache_capacity(capacity)
        .parse(&mut lexer)
}

/// `s -> $a s | <empty>`, the right-recursive letter grammar.
fn letter_grammar() -> Grammar {
    let mut grammar = Grammar::new();
    grammar.add_rule("s", &["$a", "s"]).unwrap();
    grammar.add_rule("s", &[]).unwrap();
    grammar
}

#[test]
fn test_single_terminal() {
    let mut grammar = Grammar::new();
    grammar.add_rule("value", &["$int"]).unwrap();

    let tree = parse(&grammar, &math_lexicon(), "42").unwrap();
    let root = tree.root();
    assert_eq!(root.type_name(), "value");
    assert!(!root.terminal());
    assert_eq!(root.text(), "42");
    assert_eq!(root.child_count(), 1);

    let int = root.child(0).unwrap();
    assert!(int.terminal());
    assert_eq!(int.type_name(), "int");
    assert_eq!(int.text(), "42");
}

#[test]
fn test_sequence_with_backtracking_tail() {
    let mut grammar = Grammar::new();
    grammar.add_rule("sum", &["term", "$plus", "sum"]).unwrap();
    grammar.add_rule("sum", &["term"]).unwrap();
    grammar.add_rule("term", &["$int"]).unwrap();

    let tree = parse(&grammar, &math_lexicon(), "1 + 2 + 3").unwrap();
    let root = tree.root();
    assert!(root.query("sum", &["term", "$plus", "sum"]));
    assert_eq!(root.text(), "1 + 2 + 3");

    // The nested sum covers "2 + 3"; its own tail is a plain term.
    let nested = root.child(2).unwrap();
    assert!(nested.query("sum", &["term", "$plus", "sum"]));
    let innermost = nested.child(2).unwrap();
    assert!(innermost.query("sum", &["term"]));
    assert_eq!(innermost.text(), "3");
}

#[test]
fn test_ordered_choice_first_success_wins() {
    // Alternative order is preference order: once `$x` alone matches, the
    // longer alternative is never revisited, so trailing input fails the
    // parse instead of re-exploring.
    let mut grammar = Grammar::new();
    grammar.add_rule("s", &["$x"]).unwrap();
    grammar.add_rule("s", &["$x", "$b"]).unwrap();

    let err = parse(&grammar, &letters_lexicon(), "xb").unwrap_err();
    assert_eq!(err.offset, 1);
    assert_eq!(err.found.as_ref(), "b");

    // With the alternatives flipped, the same input parses.
    let mut flipped = Grammar::new();
    flipped.add_rule("s", &["$x", "$b"]).unwrap();
    flipped.add_rule("s", &["$x"]).unwrap();
    assert!(parse(&flipped, &letters_lexicon(), "xb").is_ok());
}

#[test]
fn test_backtracking_restores_position() {
    let mut grammar = Grammar::new();
    grammar.add_rule("s", &["b_pair", "$c"]).unwrap();
    grammar.add_rule("b_pair", &["$b", "$b"]).unwrap();
    grammar.add_rule("b_pair", &["$b"]).unwrap();

    // b_pair first tries to take both letters; with only one `b` the
    // second alternative must restart from the same offset.
    let tree = parse(&grammar, &letters_lexicon(), "b c").unwrap();
    assert!(tree.root().query("s", &["b_pair", "$c"]));
    assert_eq!(tree.root().child(0).unwrap().text(), "b");
}

#[test]
fn test_right_nested_tree_with_epsilon() {
    let grammar = letter_grammar();
    let tree = parse(&grammar, &letters_lexicon(), "aaa").unwrap();

    // s(a s(a s(a s()))) - three terminals, then an empty alternative.
    let mut node = tree.root();
    let mut depth = 1;
    let mut terminals = 0;
    while node.child_count() == 2 {
        assert!(node.query("s", &["$a", "s"]));
        assert!(node.child(0).unwrap().terminal());
        terminals += 1;
        node = node.child(1).unwrap();
        depth += 1;
    }
    assert!(node.query("s", &["#"]));
    assert!(node.span().is_empty());
    assert_eq!(depth, 4);
    assert_eq!(terminals, 3);
}

#[test]
fn test_failure_offset_line_column() {
    // Scenario: `aab` cannot be derived; the furthest failure sits at the
    // `b`, where another `a` (or end of input) was required.
    let grammar = letter_grammar();
    let err = parse(&grammar, &letters_lexicon(), "aab").unwrap_err();

    assert_eq!(err.offset, 2);
    assert_eq!(err.line, 1);
    assert_eq!(err.column, 3);
    assert_eq!(err.found.as_ref(), "b");
    let expected: Vec<&str> = err.expected.iter().map(|e| e.type_name.as_ref()).collect();
    assert_eq!(expected, vec!["a"]);
    assert_eq!(err.expected[0].description.as_ref(), "the letter a");
}

#[test]
fn test_failure_line_column_on_later_line() {
    let grammar = letter_grammar();
    let err = parse(&grammar, &letters_lexicon(), "aa\nab").unwrap_err();
    // The `b` on line 2 is the furthest failure.
    assert_eq!(err.line, 2);
    assert_eq!(err.column, 2);
}

#[test]
fn test_trailing_token_fails_parse() {
    let mut grammar = Grammar::new();
    grammar.add_rule("value", &["$int"]).unwrap();

    let err = parse(&grammar, &math_lexicon(), "42 43").unwrap_err();
    assert_eq!(err.offset, 3);
    assert_eq!(err.found.as_ref(), "43");
    assert!(err.expected.is_empty(), "only end of input was acceptable");
}

#[test]
fn test_trailing_garbage_fails_parse() {
    let mut grammar = Grammar::new();
    grammar.add_rule("value", &["$int"]).unwrap();

    let err = parse(&grammar, &math_lexicon(), "42 @").unwrap_err();
    assert_eq!(err.offset, 3);
    assert_eq!(err.found.as_ref(), "@");
}

#[test]
fn test_trailing_skippable_input_is_accepted() {
    let mut grammar = Grammar::new();
    grammar.add_rule("value", &["$int"]).unwrap();
    assert!(parse(&grammar, &math_lexicon(), "42  \n").is_ok());
}

#[test]
fn test_furthest_failure_wins() {
    let mut grammar = Grammar::new();
    grammar.add_rule("s", &["$a", "$b", "$c"]).unwrap();
    grammar.add_rule("s", &["$a", "$x"]).unwrap();

    // Alternative 1 reaches offset 4 before failing; alternative 2 fails
    // earlier, at offset 2. Only the furthest record survives.
    let err = parse(&grammar, &letters_lexicon(), "a b z").unwrap_err();
    assert_eq!(err.offset, 4);
    assert_eq!(err.found.as_ref(), "z");
    let expected: Vec<&str> = err.expected.iter().map(|e| e.type_name.as_ref()).collect();
    assert_eq!(expected, vec!["c"]);
}

#[test]
fn test_expected_set_merged_at_same_offset() {
    let mut grammar = Grammar::new();
    grammar.add_rule("s", &["$a", "$b"]).unwrap();
    grammar.add_rule("s", &["$a", "$c"]).unwrap();

    let err = parse(&grammar, &letters_lexicon(), "a z").unwrap_err();
    assert_eq!(err.offset, 2);
    let mut expected: Vec<&str> = err.expected.iter().map(|e| e.type_name.as_ref()).collect();
    expected.sort_unstable();
    assert_eq!(expected, vec!["b", "c"]);
}

#[test]
fn test_memoization_equivalence() {
    let mut grammar = Grammar::new();
    grammar.add_rule("s", &["p_pair", "$q"]).unwrap();
    grammar.add_rule("s", &["p_pair", "$r"]).unwrap();
    grammar.add_rule("p_pair", &["$p", "$p"]).unwrap();

    // The second alternative re-enters p_pair at the same offset; with
    // caching that sub-parse is a memo hit, without it a full re-match.
    let lexicon = letters_lexicon();
    let cached = parse_with_capacity(&grammar, &lexicon, "ppr", Parser::DEFAULT_CACHE_CAPACITY)
        .unwrap();
    let uncached = parse_with_capacity(&grammar, &lexicon, "ppr", 0).unwrap();
    assert_eq!(cached.dump(), uncached.dump());
    assert!(cached.root().query("s", &["p_pair", "$r"]));
}

#[test]
fn test_tiny_lru_capacity_still_correct() {
    let mut grammar = Grammar::new();
    grammar.add_rule("s", &["p_pair", "$q"]).unwrap();
    grammar.add_rule("s", &["p_pair", "$r"]).unwrap();
    grammar.add_rule("p_pair", &["$p", "$p"]).unwrap();

    let lexicon = letters_lexicon();
    let full = parse(&grammar, &lexicon, "ppr").unwrap();
    let tiny = parse_with_capacity(&grammar, &lexicon, "ppr", 1).unwrap();
    assert_eq!(full.dump(), tiny.dump());
}

#[test]
fn test_deep_nesting_uses_heap_frames() {
    // A few thousand levels of right nesting would overflow a native
    // recursive descent; the explicit frame stack only grows the heap.
    let grammar = letter_grammar();
    let input = "a".repeat(3000);
    let tree = parse(&grammar, &letters_lexicon(), &input).unwrap();

    let mut depth = 0usize;
    let mut node = tree.root();
    while node.child_count() == 2 {
        depth += 1;
        node = node.child(1).unwrap();
    }
    assert_eq!(depth, 3000);
}

#[test]
fn test_determinism() {
    let mut grammar = Grammar::new();
    grammar.add_rule("sum", &["term", "$plus", "sum"]).unwrap();
    grammar.add_rule("sum", &["term"]).unwrap();
    grammar.add_rule("term", &["$int"]).unwrap();

    let lexicon = math_lexicon();
    let first = parse(&grammar, &lexicon, "8 + 15 + 99").unwrap();
    let second = parse(&grammar, &lexicon, "8 + 15 + 99").unwrap();
    assert_eq!(first.dump(), second.dump());
}

#[test]
fn test_round_trip_on_parsed_tree() {
    let mut grammar = Grammar::new();
    grammar.add_rule("sum", &["term", "$plus", "sum"]).unwrap();
    grammar.add_rule("sum", &["term"]).unwrap();
    grammar.add_rule("term", &["$int"]).unwrap();

    let tree = parse(&grammar, &math_lexicon(), "4 + 7").unwrap();
    let mut pending = vec![tree.root()];
    while let Some(node) = pending.pop() {
        assert_eq!(node.text(), node.span().text(tree.source()));
        pending.extend(node.children());
    }
}

#[test]
fn test_similar_types_reach_terminal_nodes() {
    let mut builder = Lexicon::builder();
    builder.add_type("int", "[0-9]+", "integer literal", false).unwrap();
    builder.add_type("id", "[a-zA-Z0-9]+", "identifier", false).unwrap();
    let lexicon = Arc::new(builder.build());

    let mut grammar = Grammar::new();
    grammar.add_rule("value", &["$int"]).unwrap();

    let tree = parse(&grammar, &lexicon, "123").unwrap();
    let terminal = tree.root().child(0).unwrap();
    let similar: Vec<&str> = terminal.similar_types().collect();
    assert_eq!(similar, vec!["int", "id"]);
}

#[test]
fn test_unregistered_axiom_fails_cleanly() {
    let mut grammar = Grammar::new();
    grammar.add_rule("s", &["$a"]).unwrap();
    grammar.set_axiom("missing");

    let err = parse(&grammar, &letters_lexicon(), "a").unwrap_err();
    assert_eq!(err.offset, 0);
    assert!(err.expected.is_empty());
}

#[test]
fn test_production_referencing_unknown_head_fails_alternative() {
    let mut grammar = Grammar::new();
    grammar.add_rule("s", &["ghost"]).unwrap();
    grammar.add_rule("s", &["$a"]).unwrap();

    // The first alternative references a head that was never registered;
    // the parser falls through to the second.
    let tree = parse(&grammar, &letters_lexicon(), "a").unwrap();
    assert!(tree.root().query("s", &["$a"]));
}
