use std::fmt::Display;
use std::io::{self, Write};

/// Turn a function returning an iterator into one that prints every item,
/// one per line, to stdout.
pub fn print_yielded<A, I, F>(func: F) -> impl Fn(A)
where
    F: Fn(A) -> I,
    I: IntoIterator,
    I::Item: Display,
{
    move |arg| {
        for item in func(arg) {
            println!("{}", item);
        }
    }
}

/// Like [`print_yielded`], writing to `out` and reporting write failures.
pub fn print_yielded_to<A, I, F, W>(func: F, mut out: W) -> impl FnMut(A) -> io::Result<()>
where
    F: Fn(A) -> I,
    I: IntoIterator,
    I::Item: Display,
    W: Write,
{
    move |arg| {
        for item in func(arg) {
            writeln!(out, "{}", item)?;
        }
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_yielded_to_writes_lines() {
        let mut buf = Vec::new();
        {
            let mut print = print_yielded_to(|n: u32| (1..=n).map(|i| i * 3), &mut buf);
            print(2).unwrap();
        }
        assert_eq!(String::from_utf8(buf).unwrap(), "3\n6\n");
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_print_yielded_to_reports_write_errors() {
        let mut print = print_yielded_to(
            |words: &str| words.split_whitespace().map(str::to_string).collect::<Vec<_>>(),
            ClosedPipe,
        );
        let err = print("alpha beta").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        print("").unwrap();
    }

    #[test]
    fn test_print_yielded_consumes_every_item() {
        let count = std::cell::Cell::new(0);
        let pulled = &count;
        let print = print_yielded(move |n: u32| (0..n).inspect(move |_| pulled.set(pulled.get() + 1)));
        print(3);
        assert_eq!(count.get(), 3);
    }
}
