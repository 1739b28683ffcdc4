// Parser robustness tests for the Obsidian front end
//
// Every case runs source text through the token buffer and the parser and
// checks that it either parses or fails with the expected diagnostic,
// without ever panicking.

use std::any::Any;
use std::panic;

use obsidian::ast::Node;
use obsidian::error::Diagnostic;
use obsidian::lexer::TokenBuffer;
use obsidian::parser::Parser;

enum Expected {
    Parses,
    Fails,
    FailsWith(&'static str),
}

/// One parser input and the outcome it should have
struct Case {
    name: &'static str,
    input: String,
    expected: Expected,
}

impl Case {
    fn ok(name: &'static str, input: impl Into<String>) -> Self {
        Self::new(name, input, Expected::Parses)
    }

    fn err(name: &'static str, input: impl Into<String>) -> Self {
        Self::new(name, input, Expected::Fails)
    }

    fn err_with(name: &'static str, input: impl Into<String>, message: &'static str) -> Self {
        Self::new(name, input, Expected::FailsWith(message))
    }

    fn new(name: &'static str, input: impl Into<String>, expected: Expected) -> Self {
        Self {
            name,
            input: input.into(),
            expected,
        }
    }
}

/// Lex and parse input, stopping at the first diagnostic
fn parse_input(input: &str) -> Result<Node, Diagnostic> {
    let tokens = TokenBuffer::tokenize(input)?;
    Parser::parse(tokens.as_slice())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    }
}

/// Check one case. A panic inside the parser counts as a failure.
fn run_case(case: &Case) -> Result<(), String> {
    let outcome = panic::catch_unwind(|| parse_input(&case.input))
        .map_err(|payload| format!("crashed: {}", panic_message(payload.as_ref())))?;

    match (outcome, &case.expected) {
        (Ok(_), Expected::Parses) | (Err(_), Expected::Fails) => Ok(()),
        (Ok(_), _) => Err("expected parsing to fail, but it succeeded".to_string()),
        (Err(error), Expected::Parses) => Err(format!(
            "expected parsing to succeed, but got error: {}",
            error.message
        )),
        (Err(error), Expected::FailsWith(text)) if error.message.contains(text) => Ok(()),
        (Err(error), Expected::FailsWith(text)) => Err(format!(
            "error message '{}' doesn't contain expected text '{}'",
            error.message, text
        )),
    }
}

/// Run every case and report all mismatches together.
fn check(cases: Vec<Case>) {
    let failures: Vec<String> = cases
        .iter()
        .filter_map(|case| {
            run_case(case)
                .err()
                .map(|why| format!("  {}: {}", case.name, why))
        })
        .collect();

    assert!(
        failures.is_empty(),
        "{} of {} cases failed:\n{}",
        failures.len(),
        cases.len(),
        failures.join("\n")
    );
}

// ============================================================================
// Cases
// ============================================================================

fn malformed_expressions_cases() -> Vec<Case> {
    let mut cases = Vec::new();

    // === PARENTHESES TESTS ===

    cases.push(Case::err_with(
        "unmatched_opening_paren",
        "(1 + 2",
        "Expected ')' after expression",
    ));

    cases.push(Case::err_with(
        "unmatched_opening_paren_nested",
        "((1 + 2);",
        "Expected ')' after expression",
    ));

    cases.push(Case::err_with(
        "unmatched_opening_paren_complex",
        "(1 + (2 * 3);",
        "Expected ')' after expression",
    ));

    cases.push(Case::err_with(
        "unmatched_closing_paren",
        "1 + 2);",
        "Expected ';' after expression, found ')'",
    ));

    cases.push(Case::err_with(
        "empty_parentheses",
        "();",
        "Empty parentheses are not allowed",
    ));

    cases.push(Case::err_with(
        "empty_parentheses_in_expression",
        "1 + ();",
        "Empty parentheses are not allowed",
    ));

    // === BRACE TESTS ===

    cases.push(Case::err_with(
        "unmatched_opening_brace",
        "{ x = 1;",
        "Expected '}' after block",
    ));

    cases.push(Case::err_with(
        "unmatched_closing_brace",
        "x = 1; }",
        "Expected expression, found '}'",
    ));

    cases
}

fn boundary_cases() -> Vec<Case> {
    let mut cases = Vec::new();

    cases.push(Case::ok("empty_input", ""));
    cases.push(Case::ok("only_whitespace", "   \n\t  "));
    cases.push(Case::ok("only_comments", "# nothing here\n# or here"));

    // EOF conditions
    cases.push(Case::err("unexpected_eof_after_operator", "1 +"));
    cases.push(Case::err("unexpected_eof_in_expression", "1 + ("));
    cases.push(Case::err_with(
        "missing_final_semicolon",
        "x = 1",
        "Expected ';' after expression, found end of file",
    ));

    // Very deeply nested expressions
    let deep_parens = "(".repeat(100) + "1" + &")".repeat(100) + ";";
    cases.push(Case::ok("deeply_nested_parens", deep_parens));

    // Nesting past the parser's limit is a diagnostic, not a stack overflow
    let too_deep = "x = ".to_string() + &"(".repeat(20_000) + "1" + &")".repeat(20_000) + ";";
    cases.push(Case::err_with(
        "parens_nested_too_deeply",
        too_deep,
        "Expression nested too deeply",
    ));
    cases.push(Case::err_with(
        "blocks_nested_too_deeply",
        "{".repeat(20_000) + &"}".repeat(20_000),
        "Statement nested too deeply",
    ));

    cases
}

fn operator_cases() -> Vec<Case> {
    let mut cases = Vec::new();

    // Missing operands
    cases.push(Case::err("missing_left_operand", "/ 1;"));
    cases.push(Case::err("missing_right_operand", "1 +;"));
    cases.push(Case::err("missing_both_operands", "+;"));

    // `++` and `--` are postfix here, so a trailing operand is left over
    cases.push(Case::err("double_plus", "1 ++ 2;"));
    cases.push(Case::err("double_minus", "1 -- 2;"));
    cases.push(Case::ok("mixed_operators", "1 +- 2;")); // 1 + (-2)

    cases.push(Case::ok("comparison_equal", "1 == 2;"));
    cases.push(Case::ok("comparison_not_equal", "1 != 2;"));
    cases.push(Case::ok("comparison_less", "1 < 2;"));
    cases.push(Case::ok("comparison_greater_equal", "1 >= 2;"));
    cases.push(Case::ok("shifts", "a << 2 >> 1;"));
    cases.push(Case::ok("bitwise", "a & b | c ^ ~d;"));
    cases.push(Case::ok("logical", "a && b || !c ^^ d;"));
    cases.push(Case::ok("power", "2 ** 3 ** 2;"));
    cases.push(Case::ok("prefix_and_postfix", "++i; i--; y = *p + &x;"));
    cases.push(Case::ok("ternary", "x = a > b ? a : b;"));
    cases.push(Case::err_with(
        "ternary_missing_colon",
        "x = a ? b;",
        "Expected ':' in conditional expression",
    ));
    cases.push(Case::ok("comma_operator", "a = 1, b = 2;"));

    cases
}

fn control_flow_cases() -> Vec<Case> {
    let mut cases = Vec::new();

    // If statements
    cases.push(Case::ok("valid_if", "if (true) { x = 1; }"));
    cases.push(Case::ok("if_else_chain", "if (a) x = 1; else if (b) x = 2; else x = 3;"));
    cases.push(Case::err("if_missing_condition", "if { x = 1; }"));
    cases.push(Case::err("if_missing_body", "if (true)"));

    // While loops
    cases.push(Case::ok("valid_while", "while (true) { x = 1; }"));
    cases.push(Case::err("while_missing_condition", "while { x = 1; }"));
    cases.push(Case::err("while_missing_body", "while (true)"));

    // For loops
    cases.push(Case::ok("valid_for", "for (i = 0; i < 10; i = i + 1) { println(i); }"));
    cases.push(Case::ok("for_without_clauses", "for (;;) {}"));
    cases.push(Case::err_with(
        "for_missing_semicolon",
        "for (i = 0 i < 10; i = i + 1) { println(i); }",
        "Expected ';' after for initializer",
    ));

    // Return
    cases.push(Case::ok("bare_return", "return;"));
    cases.push(Case::err_with(
        "return_missing_semicolon",
        "return 1",
        "Expected ';' after return",
    ));

    cases
}

fn literal_cases() -> Vec<Case> {
    let mut cases = Vec::new();

    cases.push(Case::ok("integer_literal", "42;"));
    cases.push(Case::ok("float_literal", "3.14;"));
    cases.push(Case::ok("string_literal", "\"hello\";"));
    cases.push(Case::ok("char_literal", "'a';"));
    cases.push(Case::ok("escaped_char_literal", "'\\n';"));
    cases.push(Case::ok("boolean_true", "true;"));
    cases.push(Case::ok("boolean_false", "false;"));

    // Invalid number formats
    cases.push(Case::err("multiple_dots", "3.14.159;"));
    cases.push(Case::err("trailing_dot", "42.;"));
    cases.push(Case::err("leading_dot", ".42;"));
    cases.push(Case::err_with(
        "integer_overflow",
        "99999999999999999999;",
        "Invalid integer literal",
    ));

    // Lexical errors
    cases.push(Case::err_with(
        "unterminated_string",
        "\"hello",
        "Unterminated string literal",
    ));
    cases.push(Case::err("unterminated_string_with_newline", "\"hello\nworld\";"));
    cases.push(Case::err_with(
        "empty_char_literal",
        "'';",
        "Empty character literal",
    ));
    cases.push(Case::err_with(
        "unexpected_character",
        "i64 x = @;",
        "Unexpected character '@'",
    ));

    cases
}

fn function_cases() -> Vec<Case> {
    let mut cases = Vec::new();

    // Calls
    cases.push(Case::ok("simple_function_call", "foo();"));
    cases.push(Case::ok("function_call_with_args", "foo(1, 2, 3);"));
    cases.push(Case::ok("nested_calls", "foo(bar(1), baz());"));
    cases.push(Case::err_with(
        "missing_closing_paren",
        "foo(1, 2;",
        "Expected ')' after arguments",
    ));
    cases.push(Case::err("missing_opening_paren", "foo 1, 2);"));
    cases.push(Case::err("trailing_comma", "foo(1, 2,);"));
    cases.push(Case::err_with(
        "call_on_literal",
        "1(2);",
        "Only named functions can be called",
    ));

    // Definitions
    cases.push(Case::ok(
        "function_definition",
        "fn add(i64 a, i64 b) -> i64 { return a + b; }",
    ));
    cases.push(Case::ok("void_function", "fn main() { println(\"hi\"); }"));
    cases.push(Case::err_with(
        "function_missing_name",
        "fn (i64 a) {}",
        "Expected function name",
    ));
    cases.push(Case::err_with(
        "parameter_missing_name",
        "fn f(i64) {}",
        "Expected parameter name",
    ));
    cases.push(Case::err_with(
        "missing_return_type",
        "fn f() -> {}",
        "Expected type name",
    ));

    cases
}

fn declaration_cases() -> Vec<Case> {
    let mut cases = Vec::new();

    cases.push(Case::ok("primitive_declaration", "i64 x = 10;"));
    cases.push(Case::ok("declaration_without_value", "bool done;"));
    cases.push(Case::ok("user_type_declaration", "Point p = origin;"));
    cases.push(Case::err_with(
        "declaration_missing_name",
        "i64 = 10;",
        "Expected variable name",
    ));
    cases.push(Case::err_with(
        "declaration_missing_semicolon",
        "i64 x = 10",
        "Expected ';' after variable declaration",
    ));

    cases
}

fn builtin_cases() -> Vec<Case> {
    let mut cases = Vec::new();

    cases.push(Case::ok("println", "println(\"hello\");"));
    cases.push(Case::ok("sizeof", "i64 n = sizeof(i64);"));
    cases.push(Case::ok("cast", "f64 y = cast<f64>(x);"));
    cases.push(Case::ok("length_and_typeof", "i64 n = length(s); string t = typeof(n);"));
    cases.push(Case::ok("alloc", "p = alloc(16);"));
    cases.push(Case::ok("unsafe_block", "unsafe { dealloc(p); };"));
    cases.push(Case::err_with(
        "sizeof_needs_type",
        "sizeof(1);",
        "Expected type name",
    ));
    cases.push(Case::err_with(
        "cast_without_type",
        "cast(x);",
        "Expected '<' after 'cast'",
    ));

    cases
}

fn assignment_cases() -> Vec<Case> {
    let mut cases = Vec::new();

    cases.push(Case::ok("simple_assignment", "x = 1;"));
    cases.push(Case::ok("assignment_with_expression", "x = 1 + 2;"));
    cases.push(Case::ok("chained_assignment", "a = b = 1;"));
    cases.push(Case::ok("compound_assignment", "x += 1; x -= 1; x *= 2; x /= 2;"));

    cases.push(Case::err("missing_value", "x =;"));
    cases.push(Case::err_with(
        "invalid_target",
        "1 = x;",
        "Invalid assignment target",
    ));

    cases
}

fn positive_cases() -> Vec<Case> {
    let mut cases = Vec::new();

    cases.push(Case::ok("simple_arithmetic", "1 + 2 * 3;"));
    cases.push(Case::ok("parentheses", "(1 + 2) * 3;"));
    cases.push(Case::ok(
        "complex_expression",
        "x = (1 + 2) * 3 + foo(4, 5);",
    ));
    cases.push(Case::ok(
        "whole_program",
        "# sum the first ten numbers\n\
         fn sum(i64 n) -> i64 {\n\
         \ti64 total = 0;\n\
         \tfor (i = 0; i < n; i++) total += i;\n\
         \treturn total;\n\
         }\n\
         fn main() {\n\
         \tprintln(sum(10));\n\
         }\n",
    ));

    cases
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn malformed_expressions() {
    check(malformed_expressions_cases());
}

#[test]
fn edge_cases() {
    check(boundary_cases());
}

#[test]
fn operators() {
    check(operator_cases());
}

#[test]
fn control_flow() {
    check(control_flow_cases());
}

#[test]
fn literals() {
    check(literal_cases());
}

#[test]
fn functions() {
    check(function_cases());
}

#[test]
fn declarations() {
    check(declaration_cases());
}

#[test]
fn builtins() {
    check(builtin_cases());
}

#[test]
fn assignments() {
    check(assignment_cases());
}

#[test]
fn whole_programs() {
    check(positive_cases());
}
