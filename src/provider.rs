//! # External input providers
//!
//! A slot that is neither wired nor holding a literal gets its value from an
//! [`InputProvider`] at the moment it is read. The byte adder asks the same
//! provider for its two operands when its operand pins are unbound.
//!
//! Providers are interchangeable: [`ConsoleProvider`] prompts an operator,
//! [`ScriptedProvider`] replays a fixed queue, [`ConstantProvider`] answers
//! every request with one value and [`FnProvider`] adapts a closure.
//!
//! ```rust
//! use logic_gates::{Network, ScriptedProvider};
//!
//! let mut net = Network::new();
//! let g = net.and("G1");
//! let mut provider = ScriptedProvider::new([1, 1]);
//! assert_eq!(net.output(g, &mut provider).unwrap().single().unwrap(), 1);
//! assert_eq!(provider.asked(), &[("G1".to_string(), "pinA".to_string()), ("G1".to_string(), "pinB".to_string())]);
//! ```

use anyhow::Result;
use log::trace;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs;
use std::io::{self, BufRead, Stdin, Stdout, Write};
use std::num::ParseIntError;
use std::path::Path;
use thiserror::Error;

use crate::gate::Width;

/// What an unbound slot is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputRequest<'a> {
    /// Label of the gate owning the slot
    pub gate: &'a str,
    /// Slot name (`pin`, `pinA`, `pinB`, `carry_in`)
    pub pin: &'a str,
    pub width: Width,
}

/// Why a provider could not supply a value.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Prompt could not be written or the reader failed
    #[error("io error while reading input: {0}")]
    Io(#[from] io::Error),
    /// Reader hit end of input
    #[error("input closed before a value for {gate}.{pin} was supplied")]
    Closed { gate: String, pin: String },
    /// Line was not a decimal integer
    #[error("invalid integer {input:?}: {source}")]
    Parse {
        input: String,
        #[source]
        source: ParseIntError,
    },
    /// Every scripted value has been consumed
    #[error("no scripted value left for {gate}.{pin}")]
    Exhausted { gate: String, pin: String },
}

/// Supplies values for slots that are not otherwise bound.
pub trait InputProvider {
    fn provide(&mut self, request: &InputRequest<'_>) -> Result<i64, ProviderError>;
}

impl<P: InputProvider + ?Sized> InputProvider for Box<P> {
    fn provide(&mut self, request: &InputRequest<'_>) -> Result<i64, ProviderError> {
        (**self).provide(request)
    }
}

/// Prompts on a writer and parses one decimal integer per line from a reader.
pub struct ConsoleProvider<R, W> {
    input: R,
    output: W,
}

impl ConsoleProvider<io::StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        let stdin: Stdin = io::stdin();
        ConsoleProvider::new(stdin.lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsoleProvider<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_parts(self) -> (R, W) {
        (self.input, self.output)
    }
}

impl<R: BufRead, W: Write> InputProvider for ConsoleProvider<R, W> {
    fn provide(&mut self, request: &InputRequest<'_>) -> Result<i64, ProviderError> {
        match request.width {
            Width::Bit => write!(
                self.output,
                "Enter {} input for gate {}: ",
                request.pin, request.gate
            )?,
            Width::Byte => write!(
                self.output,
                "Enter {} input for gate {} (8-bit integer, 0-255): ",
                request.pin, request.gate
            )?,
        }
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(ProviderError::Closed {
                gate: request.gate.to_string(),
                pin: request.pin.to_string(),
            });
        }
        let text = line.trim();
        trace!("console input gate={} pin={} raw={:?}", request.gate, request.pin, text);
        text.parse::<i64>().map_err(|source| ProviderError::Parse {
            input: text.to_string(),
            source,
        })
    }
}

/// Replays a fixed sequence of values and records who asked.
#[derive(Debug, Clone, Default)]
pub struct ScriptedProvider {
    values: VecDeque<i64>,
    asked: Vec<(String, String)>,
}

impl ScriptedProvider {
    pub fn new(values: impl IntoIterator<Item = i64>) -> Self {
        Self {
            values: values.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    pub fn push(&mut self, value: i64) {
        self.values.push_back(value);
    }

    /// `(gate label, pin name)` of every request served so far, in order.
    pub fn asked(&self) -> &[(String, String)] {
        &self.asked
    }

    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl InputProvider for ScriptedProvider {
    fn provide(&mut self, request: &InputRequest<'_>) -> Result<i64, ProviderError> {
        let value = self.values.pop_front().ok_or_else(|| ProviderError::Exhausted {
            gate: request.gate.to_string(),
            pin: request.pin.to_string(),
        })?;
        self.asked
            .push((request.gate.to_string(), request.pin.to_string()));
        Ok(value)
    }
}

/// Answers every request with the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantProvider(pub i64);

impl InputProvider for ConstantProvider {
    fn provide(&mut self, _request: &InputRequest<'_>) -> Result<i64, ProviderError> {
        Ok(self.0)
    }
}

/// Adapts a closure into a provider.
pub struct FnProvider<F>(pub F);

impl<F> InputProvider for FnProvider<F>
where
    F: FnMut(&InputRequest<'_>) -> Result<i64, ProviderError>,
{
    fn provide(&mut self, request: &InputRequest<'_>) -> Result<i64, ProviderError> {
        (self.0)(request)
    }
}

/// Serializable provider selection.
///
/// ```json
/// {"kind": "scripted", "values": [170, 85]}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderConfig {
    Console,
    Constant { value: i64 },
    Scripted { values: Vec<i64> },
}

impl ProviderConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn into_provider(self) -> Box<dyn InputProvider> {
        match self {
            ProviderConfig::Console => Box::new(ConsoleProvider::stdio()),
            ProviderConfig::Constant { value } => Box::new(ConstantProvider(value)),
            ProviderConfig::Scripted { values } => Box::new(ScriptedProvider::new(values)),
        }
    }
}
