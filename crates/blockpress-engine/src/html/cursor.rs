/// A byte cursor over an HTML fragment.
///
/// All delimiters the tokenizer stops at are ASCII, so every slice taken
/// between two stop positions falls on a UTF-8 boundary.
#[derive(Clone)]
pub struct Cursor<'a> {
    /// The fragment being tokenized.
    pub s: &'a str,
    /// Current byte index into `s`.
    pub i: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    pub fn pos(&self) -> usize {
        self.i
    }

    pub fn eof(&self) -> bool {
        self.i >= self.s.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.s.as_bytes().get(self.i).copied()
    }

    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.s.as_bytes().get(self.i + offset).copied()
    }

    pub fn starts_with(&self, pat: &[u8]) -> bool {
        self.s.as_bytes()[self.i.min(self.s.len())..].starts_with(pat)
    }

    /// ASCII case-insensitive variant of [`Cursor::starts_with`].
    pub fn starts_with_ignore_case(&self, pat: &[u8]) -> bool {
        let rest = &self.s.as_bytes()[self.i.min(self.s.len())..];
        rest.len() >= pat.len() && rest[..pat.len()].eq_ignore_ascii_case(pat)
    }

    pub fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.i += 1;
        Some(b)
    }

    pub fn bump_n(&mut self, n: usize) {
        self.i = (self.i + n).min(self.s.len());
    }

    pub fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.i += 1;
        }
    }

    /// Advances while `pred` holds and returns the consumed slice.
    pub fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.i;
        while matches!(self.peek(), Some(b) if pred(b)) {
            self.i += 1;
        }
        &self.s[start..self.i]
    }

    /// Advances to the next occurrence of `pat` (or EOF) and returns the
    /// slice before it. The cursor is left on the pattern.
    pub fn take_until(&mut self, pat: &str) -> &'a str {
        let start = self.i;
        match self.s[start..].find(pat) {
            Some(offset) => self.i = start + offset,
            None => self.i = self.s.len(),
        }
        &self.s[start..self.i]
    }

    /// Like [`Cursor::take_until`] with an ASCII case-insensitive needle.
    pub fn take_until_ignore_case(&mut self, pat: &str) -> &'a str {
        let start = self.i;
        let needle = pat.as_bytes();
        let hay = self.s.as_bytes();
        let mut j = start;
        while j + needle.len() <= hay.len() {
            if hay[j..j + needle.len()].eq_ignore_ascii_case(needle) {
                self.i = j;
                return &self.s[start..j];
            }
            j += 1;
        }
        self.i = self.s.len();
        &self.s[start..]
    }
}
