#![doc = include_str!("../README.md")]

pub mod ast;
mod buffer;
mod encoding;
mod error;
mod intern;
mod lexer;
mod limit;
mod location;
mod parser;
mod unescape;

pub use crate::buffer::Buffer;
pub use crate::encoding::Encoding;
pub use crate::error::{ErrorKind, ParseError};
pub use crate::intern::{ConstantId, ConstantPool};
pub use crate::lexer::{lex, Lexer, Token, TokenKind};
pub use crate::limit::LimitTracker;
pub use crate::location::{Location, Position, Range};
pub use crate::parser::Parser;
pub use crate::unescape::unquote_string;
