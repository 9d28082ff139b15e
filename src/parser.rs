use std::io::Write;

use crate::ast::*;
use crate::scanner::Keyword;
use crate::scanner::Pos;
use crate::scanner::Scanner;
use crate::scanner::Symbol;
use crate::scanner::Token;
use crate::scanner::TokenType;
use ordered_float::OrderedFloat;
use thiserror::Error;

// Public error type that is returned from the API
#[derive(Error, Debug)]
#[error("parse error")]
pub struct Error {}

// For unwinding, we don't actually care that much about the internal cause which is reported through the reporter
#[derive(Error, Debug)]
#[error("internal parse error")]
struct ParsePanic {}

pub trait ErrorReporter {
    fn report(&mut self, pos: Pos, message: &str);
}

/// Swallows every report; used where the caller only cares whether parsing
/// succeeded
pub struct NoopReporter {}

impl ErrorReporter for NoopReporter {
    fn report(&mut self, _pos: Pos, _message: &str) {}
}

pub struct WriteErrorReporter<'w, W>
where
    W: Write,
{
    // Store this as a mut reference so we can't accidentally lose something like stderr().lock() inside the reporter
    // that doesn't go out of scope and cause a deadlock
    write: &'w mut W,
}

impl<'w, W> WriteErrorReporter<'w, W>
where
    W: Write,
{
    pub fn new(write: &'w mut W) -> WriteErrorReporter<'w, W> {
        WriteErrorReporter { write }
    }
}

impl<'w, W> ErrorReporter for WriteErrorReporter<'w, W>
where
    W: Write,
{
    fn report(&mut self, pos: Pos, message: &str) {
        // If we can't write to our output: 🤷🏻‍♂️
        _ = writeln!(self.write, "error at {}: {}", pos, message);
    }
}

/// Track whether or not an error actually occurred and delegate to another error reporter
/// This is only meant to be used internally so that parse can piggy back on whether an error actually occurred
struct StateTrackingReporter<'a, Reporter> {
    reporter: &'a mut Reporter,
    errored: bool,
}

impl<'a, Reporter> ErrorReporter for StateTrackingReporter<'a, Reporter>
where
    Reporter: ErrorReporter,
{
    fn report(&mut self, pos: Pos, message: &str) {
        self.errored = true;
        self.reporter.report(pos, message);
    }
}

/// Hands out the identity keys that tie Variable/Assignment nodes to the
/// resolution map
struct NodeIds {
    next: ExprId,
}

impl NodeIds {
    fn next_id(&mut self) -> ExprId {
        let id = self.next;
        self.next += 1;
        id
    }
}

pub fn parse<'src, Reporter>(
    reporter: &mut Reporter,
    mut scanner: Scanner<'src>,
) -> Result<Program, Error>
where
    Reporter: ErrorReporter,
{
    let mut reporter = StateTrackingReporter {
        reporter,
        errored: false,
    };
    let mut ids = NodeIds { next: 0 };
    if let Ok(program) = program(&mut reporter, &mut scanner, &mut ids) {
        expect_eof(&mut reporter, &mut scanner);
        if reporter.errored {
            Err(Error {})
        } else {
            Ok(program)
        }
    } else {
        Err(Error {})
    }
}

fn expect_eof<'src, Reporter>(reporter: &mut Reporter, scanner: &mut Scanner<'src>)
where
    Reporter: ErrorReporter,
{
    match scanner.next() {
        // This is the success case so do nothing
        Ok(Token {
            data: TokenType::Eof,
            pos: _,
        }) => {}
        Ok(Token { data: _, pos }) => {
            reporter.report(pos, "expected eof");
        }
        Err(err) => {
            reporter.report(err.pos, "expected eof");
        }
    }
}

fn program<'src, Reporter>(
    reporter: &mut Reporter,
    scanner: &mut Scanner<'src>,
    ids: &mut NodeIds,
) -> Result<Program, ParsePanic>
where
    Reporter: ErrorReporter,
{
    let mut stmts = Vec::<Stmt>::new();
    while !scanner.is_at_eof() {
        match declaration(reporter, scanner, ids) {
            Ok(stmt) => stmts.push(stmt),
            Err(_) => synchronize(scanner),
        }
    }
    Ok(Program(stmts))
}

fn synchronize(scanner: &mut Scanner) {
    // Consume tokens until we have consumed a ';' or stopped in front of a
    // token that can begin a declaration
    // Avoid consuming EOF since we can abort there
    loop {
        let next = scanner.peek();
        match next {
            Ok(token) if token.data == Symbol::Semicolon => {
                _ = scanner.next();
                break;
            }
            Ok(token) if matches!(token.data, TokenType::Eof) => {
                // Leave the EOF inplace
                break;
            }
            Ok(token) if starts_declaration(&token.data) => {
                break;
            }
            _ => {
                // Consume the token we saw
                let _ = scanner.next();
            }
        }
    }
}

fn starts_declaration(data: &TokenType) -> bool {
    matches!(
        data,
        TokenType::Keyword(
            Keyword::Do | Keyword::Let | Keyword::If | Keyword::Return | Keyword::Namespace
        )
    )
}

fn declaration<'src, Reporter>(
    reporter: &mut Reporter,
    scanner: &mut Scanner<'src>,
    ids: &mut NodeIds,
) -> Result<Stmt, ParsePanic>
where
    Reporter: ErrorReporter,
{
    let pos = scanner.peek_pos();
    if scanner.next_if(|data| *data == Keyword::Let).is_some() {
        finish_var_decl(reporter, scanner, ids, pos)
    } else if scanner.next_if(|data| *data == Keyword::Do).is_some() {
        finish_fun_decl(reporter, scanner, ids, pos)
    } else if scanner
        .next_if(|data| *data == Keyword::Namespace)
        .is_some()
    {
        finish_namespace(reporter, scanner, ids, pos)
    } else {
        statement(reporter, scanner, ids)
    }
}

fn finish_var_decl<'src, Reporter>(
    reporter: &mut Reporter,
    scanner: &mut Scanner<'src>,
    ids: &mut NodeIds,
    pos: Pos,
) -> Result<Stmt, ParsePanic>
where
    Reporter: ErrorReporter,
{
    let identifier = expect_identifier(reporter, scanner)?.to_string();
    let initializer = if scanner.next_if(|next| *next == Symbol::Equal).is_some() {
        Some(expr(reporter, scanner, ids)?)
    } else {
        // Absence of an initializer means the variable starts out null
        None
    };
    if let Err(pos) = expect_next_symbol(scanner, Symbol::Semicolon) {
        reporter.report(pos, "expected ';' after variable declaration");
        return Err(ParsePanic {});
    }
    Ok(Stmt {
        pos,
        inner: StmtInner::VarDecl {
            name: identifier,
            init: initializer,
        },
    })
}

fn finish_fun_decl<'src, Reporter>(
    reporter: &mut Reporter,
    scanner: &mut Scanner<'src>,
    ids: &mut NodeIds,
    pos: Pos,
) -> Result<Stmt, ParsePanic>
where
    Reporter: ErrorReporter,
{
    let name = expect_identifier(reporter, scanner)?.to_string();
    if let Err(pos) = expect_next_symbol(scanner, Symbol::LeftParen) {
        reporter.report(pos, "expected '(' after function name");
        return Err(ParsePanic {});
    }

    let mut parameters = Vec::new();
    if scanner
        .next_if(|next| *next == Symbol::RightParen)
        .is_none()
    {
        comma_separated_identifiers(&mut parameters, reporter, scanner)?;
        if let Err(pos) = expect_next_symbol(scanner, Symbol::RightParen) {
            reporter.report(pos, "expect ')' after parameters");
            return Err(ParsePanic {});
        }
    }
    if let Err(pos) = expect_next_symbol(scanner, Symbol::LeftBrace) {
        reporter.report(pos, "function bodies start with '{'");
        return Err(ParsePanic {});
    }
    let body = block_body(reporter, scanner, ids)?;
    Ok(Stmt {
        pos,
        inner: StmtInner::FunDecl(FunDecl {
            name,
            parameters,
            body,
        }),
    })
}

fn finish_namespace<'src, Reporter>(
    reporter: &mut Reporter,
    scanner: &mut Scanner<'src>,
    ids: &mut NodeIds,
    pos: Pos,
) -> Result<Stmt, ParsePanic>
where
    Reporter: ErrorReporter,
{
    let name = expect_identifier(reporter, scanner)?.to_string();
    if let Err(pos) = expect_next_symbol(scanner, Symbol::LeftBrace) {
        reporter.report(pos, "namespace bodies start with '{'");
        return Err(ParsePanic {});
    }
    let body = block_body(reporter, scanner, ids)?;
    Ok(Stmt {
        pos,
        inner: StmtInner::Namespace { name, body },
    })
}

fn statement<'src, Reporter>(
    reporter: &mut Reporter,
    scanner: &mut Scanner<'src>,
    ids: &mut NodeIds,
) -> Result<Stmt, ParsePanic>
where
    Reporter: ErrorReporter,
{
    let pos = scanner.peek_pos();
    if scanner.next_if(|next| *next == Keyword::If).is_some() {
        if_stmt(reporter, scanner, ids, pos)
    } else if scanner.next_if(|next| *next == Keyword::Return).is_some() {
        let expr = if scanner.next_if(|next| *next == Symbol::Semicolon).is_some() {
            None
        } else {
            let e = expr(reporter, scanner, ids)?;
            if let Err(pos) = expect_next_symbol(scanner, Symbol::Semicolon) {
                reporter.report(pos, "expected ';' after return value");
                return Err(ParsePanic {});
            }
            Some(e)
        };
        Ok(Stmt {
            pos,
            inner: StmtInner::Return(expr),
        })
    } else if scanner.next_if(|next| *next == Symbol::LeftBrace).is_some() {
        let stmts = block_body(reporter, scanner, ids)?;
        Ok(Stmt {
            pos,
            inner: StmtInner::Block(stmts),
        })
    } else {
        expr_stmt(reporter, scanner, ids)
    }
}

// Parse up to the '}' that ends the enclosing block, function, or namespace
// body; callers wrap the statements as they need them
fn block_body<'src, Reporter>(
    reporter: &mut Reporter,
    scanner: &mut Scanner<'src>,
    ids: &mut NodeIds,
) -> Result<Vec<Stmt>, ParsePanic>
where
    Reporter: ErrorReporter,
{
    let mut stmts: Vec<Stmt> = Vec::new();
    while !scanner.is_at_eof() && !peek_matches(scanner, Symbol::RightBrace) {
        let stmt = declaration(reporter, scanner, ids)?;
        stmts.push(stmt);
    }
    if let Err(pos) = expect_next_symbol(scanner, Symbol::RightBrace) {
        reporter.report(pos, "expected '}' after block");
        return Err(ParsePanic {});
    }
    Ok(stmts)
}

fn if_stmt<'src, Reporter>(
    reporter: &mut Reporter,
    scanner: &mut Scanner<'src>,
    ids: &mut NodeIds,
    pos: Pos,
) -> Result<Stmt, ParsePanic>
where
    Reporter: ErrorReporter,
{
    if let Err(pos) = expect_next_symbol(scanner, Symbol::LeftParen) {
        reporter.report(pos, "expected '(' after if");
        return Err(ParsePanic {});
    }
    let test_expr = expr(reporter, scanner, ids)?;
    if let Err(pos) = expect_next_symbol(scanner, Symbol::RightParen) {
        reporter.report(pos, "expected ')' after if condition");
        return Err(ParsePanic {});
    }
    let then_branch = Box::new(statement(reporter, scanner, ids)?);
    let else_branch = if scanner.next_if(|next| *next == Keyword::Else).is_some() {
        Some(Box::new(statement(reporter, scanner, ids)?))
    } else {
        None
    };
    Ok(Stmt {
        pos,
        inner: StmtInner::If {
            expr: test_expr,
            then: then_branch,
            or_else: else_branch,
        },
    })
}

fn expr_stmt<'src, Reporter>(
    reporter: &mut Reporter,
    scanner: &mut Scanner<'src>,
    ids: &mut NodeIds,
) -> Result<Stmt, ParsePanic>
where
    Reporter: ErrorReporter,
{
    let expr = expr(reporter, scanner, ids)?;
    if let Err(pos) = expect_next_symbol(scanner, Symbol::Semicolon) {
        reporter.report(pos, "expected ';' after an expression");
        return Err(ParsePanic {});
    }
    Ok(Stmt {
        pos: expr.pos,
        inner: StmtInner::Expr(expr),
    })
}

fn expr<'src, Reporter>(
    reporter: &mut Reporter,
    scanner: &mut Scanner<'src>,
    ids: &mut NodeIds,
) -> Result<Expr, ParsePanic>
where
    Reporter: ErrorReporter,
{
    assignment(reporter, scanner, ids)
}

fn assignment<'src, Reporter>(
    reporter: &mut Reporter,
    scanner: &mut Scanner<'src>,
    ids: &mut NodeIds,
) -> Result<Expr, ParsePanic>
where
    Reporter: ErrorReporter,
{
    let expr = logical_or(reporter, scanner, ids)?;
    if let Some(eq) = scanner.next_if(|token| *token == Symbol::Equal) {
        // Right associative so that a = b = c works
        let rhs = Box::new(assignment(reporter, scanner, ids)?);
        match expr.inner {
            // A valid assignment target
            ExprInner::Variable { id: _, name } => Ok(Expr {
                pos: eq.pos,
                inner: ExprInner::Assignment {
                    id: ids.next_id(),
                    target: name,
                    expr: rhs,
                },
            }),
            // Not a valid assignment target
            // Report the error to trigger top level error, but don't error out here so we continue parsing
            inner => {
                reporter.report(eq.pos, "Invalid assignment target.");
                Ok(Expr {
                    pos: expr.pos,
                    inner,
                })
            }
        }
    } else {
        Ok(expr)
    }
}

// This encapsulates the logic of the recursive parsing of levels of binary expression operators
// We define a set of matching symbols (and we have the symbol -> binary op) as well as a higher precedence parser
const EQUALITY_SYMBOLS: [Symbol; 2] = [Symbol::EqualEqual, Symbol::BangEqual];

const COMPARISON_SYMBOLS: [Symbol; 4] = [
    Symbol::Greater,
    Symbol::GreaterEqual,
    Symbol::Less,
    Symbol::LessEqual,
];

const TERM_SYMBOLS: [Symbol; 2] = [Symbol::Minus, Symbol::Plus];

const FACTOR_SYMBOLS: [Symbol; 5] = [
    Symbol::Star,
    Symbol::Slash,
    Symbol::Percent,
    Symbol::Pipe,
    Symbol::Amp,
];

// All binary symbols, This is used for error production in primary to recover when we see a binary symbol without a
// left hand operand
const BINARY_SYMBOLS: [Symbol; 13] = [
    Symbol::EqualEqual,
    Symbol::BangEqual,
    Symbol::Greater,
    Symbol::GreaterEqual,
    Symbol::Less,
    Symbol::LessEqual,
    Symbol::Minus,
    Symbol::Plus,
    Symbol::Star,
    Symbol::Slash,
    Symbol::Percent,
    Symbol::Pipe,
    Symbol::Amp,
];

fn logical_or<'src, Reporter>(
    reporter: &mut Reporter,
    scanner: &mut Scanner<'src>,
    ids: &mut NodeIds,
) -> Result<Expr, ParsePanic>
where
    Reporter: ErrorReporter,
{
    left_recursive_logical_op(reporter, scanner, ids, Symbol::PipePipe, logical_and)
}

fn logical_and<'src, Reporter>(
    reporter: &mut Reporter,
    scanner: &mut Scanner<'src>,
    ids: &mut NodeIds,
) -> Result<Expr, ParsePanic>
where
    Reporter: ErrorReporter,
{
    left_recursive_logical_op(reporter, scanner, ids, Symbol::AmpAmp, equality)
}

fn equality<'src, Reporter>(
    reporter: &mut Reporter,
    scanner: &mut Scanner<'src>,
    ids: &mut NodeIds,
) -> Result<Expr, ParsePanic>
where
    Reporter: ErrorReporter,
{
    left_recursive_binary_op(reporter, scanner, ids, &EQUALITY_SYMBOLS, comparison)
}

fn comparison<'src, Reporter>(
    reporter: &mut Reporter,
    scanner: &mut Scanner<'src>,
    ids: &mut NodeIds,
) -> Result<Expr, ParsePanic>
where
    Reporter: ErrorReporter,
{
    left_recursive_binary_op(reporter, scanner, ids, &COMPARISON_SYMBOLS, term)
}

fn term<'src, Reporter>(
    reporter: &mut Reporter,
    scanner: &mut Scanner<'src>,
    ids: &mut NodeIds,
) -> Result<Expr, ParsePanic>
where
    Reporter: ErrorReporter,
{
    left_recursive_binary_op(reporter, scanner, ids, &TERM_SYMBOLS, factor)
}

fn factor<'src, Reporter>(
    reporter: &mut Reporter,
    scanner: &mut Scanner<'src>,
    ids: &mut NodeIds,
) -> Result<Expr, ParsePanic>
where
    Reporter: ErrorReporter,
{
    left_recursive_binary_op(reporter, scanner, ids, &FACTOR_SYMBOLS, unary)
}

const UNARY_SYMBOLS: [Symbol; 2] = [Symbol::Minus, Symbol::Bang];

fn unary<'src, Reporter>(
    reporter: &mut Reporter,
    scanner: &mut Scanner<'src>,
    ids: &mut NodeIds,
) -> Result<Expr, ParsePanic>
where
    Reporter: ErrorReporter,
{
    let pos = scanner.peek_pos();
    if let Some(symbol) = scanner.next_if_some(|next| match next {
        TokenType::Symbol(symbol) if UNARY_SYMBOLS.contains(symbol) => Some(*symbol),
        _ => None,
    }) {
        let operator = symbol_to_unary_op(symbol);
        let right = Box::new(unary(reporter, scanner, ids)?);
        Ok(Expr {
            pos,
            inner: ExprInner::Unary {
                op: operator,
                expr: right,
            },
        })
    } else {
        call(reporter, scanner, ids)
    }
}

fn call<'src, Reporter>(
    reporter: &mut Reporter,
    scanner: &mut Scanner<'src>,
    ids: &mut NodeIds,
) -> Result<Expr, ParsePanic>
where
    Reporter: ErrorReporter,
{
    let mut expr = primary(reporter, scanner, ids)?;
    while scanner.next_if(|next| *next == Symbol::LeftParen).is_some() {
        expr = finish_call(reporter, scanner, ids, expr)?;
    }
    Ok(expr)
}

fn finish_call<'src, Reporter>(
    reporter: &mut Reporter,
    scanner: &mut Scanner<'src>,
    ids: &mut NodeIds,
    callee: Expr,
) -> Result<Expr, ParsePanic>
where
    Reporter: ErrorReporter,
{
    let pos = callee.pos;
    let mut args = Vec::new();
    if scanner
        .next_if(|next| *next == Symbol::RightParen)
        .is_none()
    {
        loop {
            if args.len() >= 255 {
                reporter.report(scanner.peek_pos(), "Too many function arguments");
            } else {
                let arg = expr(reporter, scanner, ids)?;
                args.push(arg);
            }
            if scanner.next_if(|next| *next == Symbol::Comma).is_none() {
                break;
            }
        }
        // Note: we only need to consume the trailing ) if we didn't consume it in the no args branch
        if let Err(pos) = expect_next_symbol(scanner, Symbol::RightParen) {
            reporter.report(pos, "expect ')' after arguments");
            return Err(ParsePanic {});
        }
    }
    Ok(Expr {
        pos,
        inner: ExprInner::Call {
            callee: Box::new(callee),
            arguments: args,
        },
    })
}

fn primary<'src, Reporter>(
    reporter: &mut Reporter,
    scanner: &mut Scanner<'src>,
    ids: &mut NodeIds,
) -> Result<Expr, ParsePanic>
where
    Reporter: ErrorReporter,
{
    match scanner.next() {
        Ok(token) => {
            let inner = match token.data {
                TokenType::Keyword(Keyword::True) => ExprInner::Literal(Literal::Boolean(true)),
                TokenType::Keyword(Keyword::False) => ExprInner::Literal(Literal::Boolean(false)),
                TokenType::Keyword(Keyword::Null) => ExprInner::Literal(Literal::Null),
                TokenType::String(string) => ExprInner::Literal(Literal::Str(string.to_string())),
                TokenType::Int(number) => ExprInner::Literal(Literal::Int(number)),
                TokenType::Float(number) => {
                    ExprInner::Literal(Literal::Float(OrderedFloat(number)))
                }
                TokenType::Hex(digits) => ExprInner::Literal(Literal::Hex(digits.to_string())),
                TokenType::Bin(digits) => ExprInner::Literal(Literal::Bin(digits.to_string())),
                TokenType::Identifier(ident) => ExprInner::Variable {
                    id: ids.next_id(),
                    name: ident.to_string(),
                },
                TokenType::Symbol(Symbol::LeftParen) => {
                    let inner = expr(reporter, scanner, ids)?;
                    match scanner.next() {
                        Ok(token) => match token.data {
                            TokenType::Symbol(Symbol::RightParen) => {
                                // This is the happy path in that we have successfully matched the trailing group
                                ExprInner::Group(Box::new(inner))
                            }
                            _ => {
                                reporter.report(token.pos, "expected a ')'");
                                return Err(ParsePanic {});
                            }
                        },
                        Err(scan_err) => {
                            reporter.report(scan_err.pos, scan_err.error.message());
                            return Err(ParsePanic {});
                        }
                    }
                }
                // An unexpected binary symbol so lets try and parse the rhs before raising the error
                // - should be trapped by unary
                TokenType::Symbol(symbol) if BINARY_SYMBOLS.contains(&symbol) => {
                    reporter.report(token.pos, "binary operator without a left-hand side");
                    // result is unimportant, we are bailing anyway
                    let _rhs = expr(reporter, scanner, ids);
                    return Err(ParsePanic {});
                }
                _ => {
                    reporter.report(
                        token.pos,
                        "unexpected token: expected true, false, null, number, string or (",
                    );
                    return Err(ParsePanic {});
                }
            };
            Ok(Expr {
                pos: token.pos,
                inner,
            })
        }
        Err(scan_err) => {
            reporter.report(scan_err.pos, scan_err.error.message());
            Err(ParsePanic {})
        }
    }
}

fn left_recursive_binary_op<'src, Reporter, F>(
    reporter: &mut Reporter,
    scanner: &mut Scanner<'src>,
    ids: &mut NodeIds,
    symbols: &[Symbol],
    higher_precedence: F,
) -> Result<Expr, ParsePanic>
where
    Reporter: ErrorReporter,
    F: Fn(&mut Reporter, &mut Scanner<'src>, &mut NodeIds) -> Result<Expr, ParsePanic>,
{
    let mut expr = higher_precedence(reporter, scanner, ids)?;
    loop {
        let op_pos = scanner.peek_pos();
        let Some(symbol) = scanner.next_if_some(|next| match next {
            TokenType::Symbol(s) if symbols.contains(s) => Some(*s),
            _ => None,
        }) else {
            break;
        };
        let binary_op = symbol_to_binary_op(symbol);
        let right = Box::new(higher_precedence(reporter, scanner, ids)?);
        expr = Expr {
            pos: op_pos,
            inner: ExprInner::Binary {
                left: Box::new(expr),
                op: binary_op,
                right,
            },
        }
    }
    Ok(expr)
}

fn left_recursive_logical_op<'src, Reporter, F>(
    reporter: &mut Reporter,
    scanner: &mut Scanner<'src>,
    ids: &mut NodeIds,
    symbol: Symbol,
    higher_precedence: F,
) -> Result<Expr, ParsePanic>
where
    Reporter: ErrorReporter,
    F: Fn(&mut Reporter, &mut Scanner<'src>, &mut NodeIds) -> Result<Expr, ParsePanic>,
{
    let mut expr = higher_precedence(reporter, scanner, ids)?;
    loop {
        let op_pos = scanner.peek_pos();
        if scanner.next_if(|next| *next == symbol).is_none() {
            break;
        }
        let logical_op = symbol_to_logical_op(symbol);
        let right = Box::new(higher_precedence(reporter, scanner, ids)?);
        expr = Expr {
            pos: op_pos,
            inner: ExprInner::Logical {
                left: Box::new(expr),
                op: logical_op,
                right,
            },
        }
    }
    Ok(expr)
}

fn symbol_to_binary_op(symbol: Symbol) -> BinaryOp {
    match symbol {
        Symbol::EqualEqual => BinaryOp::Equal,
        Symbol::BangEqual => BinaryOp::NotEqual,
        Symbol::Less => BinaryOp::LessThan,
        Symbol::LessEqual => BinaryOp::LessThanEqual,
        Symbol::Greater => BinaryOp::GreaterThan,
        Symbol::GreaterEqual => BinaryOp::GreaterThanEqual,
        Symbol::Plus => BinaryOp::Add,
        Symbol::Minus => BinaryOp::Subtract,
        Symbol::Star => BinaryOp::Multiply,
        Symbol::Slash => BinaryOp::Divide,
        Symbol::Percent => BinaryOp::Modulo,
        Symbol::Pipe => BinaryOp::BitOr,
        Symbol::Amp => BinaryOp::BitAnd,
        s => panic!("symbol was not a valid binary operator: {}", s),
    }
}

fn symbol_to_logical_op(symbol: Symbol) -> LogicalOp {
    match symbol {
        Symbol::AmpAmp => LogicalOp::And,
        Symbol::PipePipe => LogicalOp::Or,
        s => panic!("symbol was not a valid logical operator: {}", s),
    }
}

fn symbol_to_unary_op(symbol: Symbol) -> UnaryOp {
    match symbol {
        Symbol::Bang => UnaryOp::Not,
        Symbol::Minus => UnaryOp::Negative,
        s => panic!("symbol was not a valid unary operator: {}", s),
    }
}

/// Expect that the next token from scanner is the given symbol
/// Returns the pos of the failed token (either due to error or mismatch) in Err
fn expect_next_symbol(scanner: &mut Scanner, symbol: Symbol) -> Result<(), Pos> {
    let next = scanner.next();
    match next {
        Ok(token) if token.data == symbol => Ok(()),
        Ok(token) => Err(token.pos),
        Err(err) => Err(err.pos),
    }
}

fn expect_identifier<'code, Reporter>(
    reporter: &mut Reporter,
    scanner: &mut Scanner<'code>,
) -> Result<&'code str, ParsePanic>
where
    Reporter: ErrorReporter,
{
    match scanner.next() {
        Ok(Token {
            data: TokenType::Identifier(ident),
            pos: _,
        }) => Ok(ident),
        Ok(Token { data: _, pos }) => {
            reporter.report(pos, "expected identifier");
            Err(ParsePanic {})
        }
        Err(error) => {
            reporter.report(error.pos, "expected identifier");
            Err(ParsePanic {})
        }
    }
}

// Helper to determine if a scanner result matches a specific input
fn peek_matches<'code, A>(scanner: &mut Scanner<'code>, rhs: A) -> bool
where
    TokenType<'code>: PartialEq<A>,
{
    match scanner.peek() {
        Ok(token) => token.data == rhs,
        _ => false,
    }
}

fn comma_separated_identifiers<'src, Reporter>(
    idents: &mut Vec<String>,
    reporter: &mut Reporter,
    scanner: &mut Scanner<'src>,
) -> Result<(), ParsePanic>
where
    Reporter: ErrorReporter,
{
    idents.push(expect_identifier(reporter, scanner)?.to_string());
    while scanner.next_if(|next| *next == Symbol::Comma).is_some() {
        if idents.len() >= 255 {
            reporter.report(scanner.peek_pos(), "Too many parameters");
        } else {
            idents.push(expect_identifier(reporter, scanner)?.to_string());
        }
    }

    Ok(())
}
