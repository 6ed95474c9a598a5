use {
    liso::{liso, OutputOnly},
    std::{cell::RefCell, rc::Rc},
};

/// Destination for interpreted program output (`print`, REPL echo).
/// Diagnostics never go through here; the reporter writes to stderr.
pub enum Output {
    /// Plain stdout, for script runs.
    Standard,
    /// The REPL's liso output handle, so program output interleaves cleanly
    /// with the prompt.
    Repl(OutputOnly),
    /// In-memory buffer for tests.
    Capture(Rc<RefCell<String>>),
}

impl Output {
    pub fn capture() -> Self {
        Output::Capture(Rc::new(RefCell::new(String::new())))
    }

    pub fn println(&self, line: impl AsRef<str>) {
        match self {
            Output::Standard => println!("{}", line.as_ref()),
            Output::Repl(out) => out.println(liso!(line.as_ref())),
            Output::Capture(buffer) => {
                let mut buffer = buffer.borrow_mut();
                buffer.push_str(line.as_ref());
                buffer.push('\n');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, pretty_assertions::assert_eq};

    #[test]
    fn capture_accumulates_lines() {
        let buffer = Rc::new(RefCell::new(String::new()));
        let out = Output::Capture(buffer.clone());
        out.println("1");
        out.println("two");
        assert_eq!(*buffer.borrow(), "1\ntwo\n");
    }
}
