// file: src/utils/timer.rs
// description: wraps callables, measures wall-clock time and logs how long they took
// reference: https://doc.rust-lang.org/std/time/struct.Instant.html

use crate::logging::Logger;
use std::any::type_name;
use std::time::{Duration, Instant};

/// Anything that can take an informational message.
pub trait LogSink {
    fn info(&self, message: &str);
}

impl<T: LogSink + ?Sized> LogSink for &T {
    fn info(&self, message: &str) {
        (**self).info(message);
    }
}

impl LogSink for Logger {
    #[track_caller]
    fn info(&self, message: &str) {
        Logger::info(self, message);
    }
}

/// Elapsed time split by successive floor-divmod: seconds by 60, then
/// minutes by 60. All parts stay floating point, as they are printed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElapsedTime {
    pub hours: f64,
    pub minutes: f64,
    pub seconds: f64,
}

impl ElapsedTime {
    pub fn from_secs_f64(elapsed: f64) -> Self {
        let (minutes, seconds) = divmod(elapsed, 60.0);
        let (hours, minutes) = divmod(minutes, 60.0);
        Self {
            hours,
            minutes,
            seconds,
        }
    }

    pub fn total_seconds(&self) -> f64 {
        self.hours * 3600.0 + self.minutes * 60.0 + self.seconds
    }
}

impl From<Duration> for ElapsedTime {
    fn from(duration: Duration) -> Self {
        Self::from_secs_f64(duration.as_secs_f64())
    }
}

fn divmod(value: f64, divisor: f64) -> (f64, f64) {
    let remainder = value.rem_euclid(divisor);
    let quotient = ((value - remainder) / divisor).round();
    (quotient, remainder)
}

pub fn completion_message(name: &str, elapsed: ElapsedTime) -> String {
    format!(
        "{} took {} hours, {} minutes, {} seconds to complete.",
        name,
        float_repr(elapsed.hours),
        float_repr(elapsed.minutes),
        float_repr(elapsed.seconds)
    )
}

/// Shortest round-trip float text with a signed, two digit exponent
/// (`0.0`, `5.4`, `3.1e-06`, `1e+16`).
fn float_repr(value: f64) -> String {
    let shortest = format!("{:?}", value);
    let Some((mantissa, exponent)) = shortest.split_once('e') else {
        return shortest;
    };
    match exponent.parse::<i32>() {
        Ok(exp) => {
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exp.unsigned_abs())
        }
        Err(_) => shortest,
    }
}

/// Calling convention for [`Timed`]: a callable invoked with its arguments
/// packed in a tuple.
pub trait Callable<Args> {
    type Output;

    fn call_with(&self, args: Args) -> Self::Output;
}

macro_rules! impl_callable {
    ($($arg:ident),*) => {
        impl<Func, Out, $($arg),*> Callable<($($arg,)*)> for Func
        where
            Func: Fn($($arg),*) -> Out,
        {
            type Output = Out;

            #[allow(non_snake_case)]
            fn call_with(&self, ($($arg,)*): ($($arg,)*)) -> Out {
                (self)($($arg),*)
            }
        }
    };
}

impl_callable!();
impl_callable!(A1);
impl_callable!(A1, A2);
impl_callable!(A1, A2, A3);
impl_callable!(A1, A2, A3, A4);
impl_callable!(A1, A2, A3, A4, A5);
impl_callable!(A1, A2, A3, A4, A5, A6);

pub fn timer<L: LogSink>(logger: L) -> Timer<L> {
    Timer::new(logger)
}

#[derive(Debug, Clone)]
pub struct Timer<L> {
    sink: L,
}

impl<L: LogSink> Timer<L> {
    pub fn new(sink: L) -> Self {
        Self { sink }
    }

    /// Run a one-shot closure and log its duration under `name`.
    pub fn time<T>(&self, name: &str, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();
        self.sink.info(&completion_message(name, elapsed.into()));
        result
    }
}

impl<L: LogSink + Clone> Timer<L> {
    /// Wrap `func`, naming it after the function item it is.
    pub fn wrap<F>(&self, func: F) -> Timed<F, L> {
        self.wrap_named(callable_name::<F>(), func)
    }

    pub fn wrap_named<F>(&self, name: impl Into<String>, func: F) -> Timed<F, L> {
        Timed {
            name: name.into(),
            func,
            sink: self.sink.clone(),
        }
    }
}

/// Last path segment of a function item's type name, `closure` for closures.
fn callable_name<F>() -> String {
    let full = type_name::<F>();
    if full.ends_with("{{closure}}") {
        return "closure".to_string();
    }
    let path = full.split('<').next().unwrap_or(full);
    match path.rsplit("::").next() {
        Some(segment) if !segment.is_empty() => segment.to_string(),
        _ => full.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct Timed<F, L> {
    name: String,
    func: F,
    sink: L,
}

impl<F, L: LogSink> Timed<F, L> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Call the wrapped function and log one completion line.
    ///
    /// A panic in the wrapped function unwinds through here and nothing is
    /// logged.
    pub fn call<Args>(&self, args: Args) -> <F as Callable<Args>>::Output
    where
        F: Callable<Args>,
    {
        let start = Instant::now();
        let result = self.func.call_with(args);
        let elapsed = start.elapsed();
        self.sink
            .info(&completion_message(&self.name, elapsed.into()));
        result
    }

    /// Like [`Timed::call`] for fallible functions: only an `Ok` is logged,
    /// an `Err` is handed back untouched.
    pub fn try_call<Args, T, E>(&self, args: Args) -> Result<T, E>
    where
        F: Callable<Args, Output = Result<T, E>>,
    {
        let start = Instant::now();
        let value = self.func.call_with(args)?;
        let elapsed = start.elapsed();
        self.sink
            .info(&completion_message(&self.name, elapsed.into()));
        Ok(value)
    }

    pub fn into_inner(self) -> F {
        self.func
    }
}
