//! Shared request fixtures for the strata benchmarks.

use strata_http::stream::ChunkedStream;

pub static SMALL_HEADER: TestFile = TestFile::new("get_small.txt", include_str!("../resources/request/get_small.txt"));
pub static LARGE_HEADER: TestFile = TestFile::new("get_large.txt", include_str!("../resources/request/get_large.txt"));

#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    file: TestFile,
    chunk_size: Option<usize>,
}

impl TestCase {
    /// The whole file delivered by one read.
    pub fn whole(name: &'static str, file: TestFile) -> Self {
        Self { name, file, chunk_size: None }
    }

    /// The file delivered `chunk_size` bytes per read.
    pub fn chunked(name: &'static str, file: TestFile, chunk_size: usize) -> Self {
        Self { name, file, chunk_size: Some(chunk_size) }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn file(&self) -> &TestFile {
        &self.file
    }

    pub fn stream(&self) -> ChunkedStream {
        match self.chunk_size {
            Some(size) => ChunkedStream::every(self.file.content(), size),
            None => ChunkedStream::single(self.file.content()),
        }
    }
}

#[derive(Debug, Copy, Clone)]
pub struct TestFile {
    file_name: &'static str,
    content: &'static str,
}

impl TestFile {
    pub const fn new(file_name: &'static str, content: &'static str) -> Self {
        Self { file_name, content }
    }

    pub fn content(&self) -> &'static str {
        self.content
    }

    pub fn file_name(&self) -> &'static str {
        self.file_name
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}
