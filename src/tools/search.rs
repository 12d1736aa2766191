//! Documentation search over a fixed corpus.
//!
//! No network access happens here. Queries are matched against the topic
//! keys of a [`Corpus`]; the built-in one carries a handful of reference
//! pages an agent typically needs for small Python tasks, and a YAML file can
//! replace it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use super::{parse_params, ExecutionContext, Payload, Tool, ToolResult};
use crate::error::{CorpusError, ToolError};

/// One page of documentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Topic key; its whitespace-separated words are what queries match.
    pub topic: String,
    pub title: String,
    /// Where the page came from, usually a URL.
    pub source: String,
    pub content: String,
}

/// An ordered, read-only set of documents.
pub trait Corpus: Send + Sync {
    /// Documents in the order hits are reported.
    fn documents(&self) -> &[Document];
}

/// A corpus held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticCorpus {
    documents: Vec<Document>,
}

impl StaticCorpus {
    /// Build a corpus, rejecting empty or duplicate topic keys.
    ///
    /// Topic keys are compared case-insensitively.
    pub fn new(documents: Vec<Document>) -> Result<Self, CorpusError> {
        let mut seen = HashSet::new();
        for doc in &documents {
            let key = doc.topic.trim().to_lowercase();
            if key.is_empty() {
                return Err(CorpusError::EmptyTopic(doc.title.clone()));
            }
            if !seen.insert(key) {
                return Err(CorpusError::DuplicateTopic(doc.topic.clone()));
            }
        }
        Ok(Self { documents })
    }

    /// The built-in reference pages.
    pub fn builtin() -> Self {
        let documents = BUILTIN_DOCS
            .iter()
            .map(|(topic, title, source, content)| Document {
                topic: topic.to_string(),
                title: title.to_string(),
                source: source.to_string(),
                content: content.to_string(),
            })
            .collect();
        Self { documents }
    }

    /// Parse a YAML list of documents.
    ///
    /// ```yaml
    /// - topic: python json
    ///   title: Python json Documentation
    ///   source: https://docs.python.org/3/library/json.html
    ///   content: |
    ///     # json
    /// ```
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CorpusError> {
        let documents: Vec<Document> = serde_yaml::from_str(yaml)?;
        Self::new(documents)
    }

    /// Load a YAML corpus from disk.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, CorpusError> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path).map_err(|source| CorpusError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let corpus = Self::from_yaml_str(&yaml)?;
        info!(path = %path.display(), documents = corpus.documents.len(), "Loaded search corpus");
        Ok(corpus)
    }
}

impl Corpus for StaticCorpus {
    fn documents(&self) -> &[Document] {
        &self.documents
    }
}

/// A single search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub source: String,
    /// Leading characters of the document followed by `...`.
    pub snippet: String,
}

/// Result of a search. An empty `results` is a normal outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchReport {
    pub query: String,
    pub results: Vec<SearchHit>,
    pub message: String,
}

impl Payload for SearchReport {}

/// Full text of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentationPage {
    pub topic: String,
    pub title: String,
    pub source: String,
    pub content: String,
}

impl Payload for DocumentationPage {}

/// Search front-end over a corpus.
#[derive(Clone)]
pub struct DocSearch {
    corpus: Arc<dyn Corpus>,
    snippet_chars: usize,
}

impl DocSearch {
    pub fn new(corpus: Arc<dyn Corpus>, snippet_chars: usize) -> Self {
        Self {
            corpus,
            snippet_chars,
        }
    }

    /// Find documents whose topic key shares a word with `query`.
    ///
    /// Matching is case-insensitive; hits keep corpus order.
    pub fn search(&self, query: &str) -> ToolResult<SearchReport> {
        self.search_inner(query).into()
    }

    fn search_inner(&self, query: &str) -> Result<SearchReport, ToolError> {
        let tokens = query_tokens(query);

        let results: Vec<SearchHit> = self
            .corpus
            .documents()
            .iter()
            .filter(|doc| {
                doc.topic
                    .to_lowercase()
                    .split_whitespace()
                    .any(|word| tokens.contains(word))
            })
            .map(|doc| SearchHit {
                title: doc.title.clone(),
                source: doc.source.clone(),
                snippet: snippet(&doc.content, self.snippet_chars),
            })
            .collect();

        debug!(query = query, hits = results.len(), "Searched documentation");

        let message = if results.is_empty() {
            format!(
                "No documentation found for '{}'. Try a different search term.",
                query
            )
        } else {
            format!("Found {} result(s)", results.len())
        };

        Ok(SearchReport {
            query: query.to_string(),
            results,
            message,
        })
    }

    /// Full content of the first document whose topic key contains `topic`
    /// or is contained in it, compared case-insensitively.
    pub fn get_documentation(&self, topic: &str) -> ToolResult<DocumentationPage> {
        self.get_documentation_inner(topic).into()
    }

    fn get_documentation_inner(&self, topic: &str) -> Result<DocumentationPage, ToolError> {
        let wanted = topic.trim().to_lowercase();
        if wanted.is_empty() {
            return Err(ToolError::InvalidParameters(
                "Topic cannot be empty".to_string(),
            ));
        }

        self.corpus
            .documents()
            .iter()
            .find(|doc| {
                let key = doc.topic.to_lowercase();
                key.contains(&wanted) || wanted.contains(&key)
            })
            .map(|doc| DocumentationPage {
                topic: doc.topic.clone(),
                title: doc.title.clone(),
                source: doc.source.clone(),
                content: doc.content.clone(),
            })
            .ok_or_else(|| {
                ToolError::NotFound(format!("No documentation found for topic '{}'", topic))
            })
    }
}

/// Lower-cased query words with surrounding punctuation removed.
fn query_tokens(query: &str) -> HashSet<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

fn snippet(content: &str, max_chars: usize) -> String {
    let mut out: String = content.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

/// Parameters for the web_search tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SearchParams {
    query: String,
}

/// Tool exposing [`DocSearch::search`].
pub struct DocSearchTool {
    corpus: Arc<dyn Corpus>,
}

impl DocSearchTool {
    pub fn new(corpus: Arc<dyn Corpus>) -> Self {
        Self { corpus }
    }
}

#[async_trait]
impl Tool for DocSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the documentation corpus for a library or API. Returns titles, sources and short snippets."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search terms, e.g. 'python argparse'"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ExecutionContext) -> Result<Value, ToolError> {
        let params: SearchParams = parse_params(args)?;
        let search = DocSearch::new(self.corpus.clone(), ctx.config.snippet_chars);
        Ok(search.search(&params.query).to_json())
    }
}

/// Parameters for the get_documentation tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DocumentationParams {
    topic: String,
}

/// Tool exposing [`DocSearch::get_documentation`].
pub struct GetDocumentationTool {
    corpus: Arc<dyn Corpus>,
}

impl GetDocumentationTool {
    pub fn new(corpus: Arc<dyn Corpus>) -> Self {
        Self { corpus }
    }
}

#[async_trait]
impl Tool for GetDocumentationTool {
    fn name(&self) -> &str {
        "get_documentation"
    }

    fn description(&self) -> &str {
        "Fetch the full text of one documentation page by topic, e.g. 'open-meteo' or 'python unittest'."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "topic": {
                    "type": "string",
                    "description": "Topic key of the page"
                }
            },
            "required": ["topic"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ExecutionContext) -> Result<Value, ToolError> {
        let params: DocumentationParams = parse_params(args)?;
        let search = DocSearch::new(self.corpus.clone(), ctx.config.snippet_chars);
        Ok(search.get_documentation(&params.topic).to_json())
    }
}

/// (topic, title, source, content)
const BUILTIN_DOCS: &[(&str, &str, &str, &str)] = &[
    (
        "open-meteo",
        "Open-Meteo API Documentation",
        "https://open-meteo.com/en/docs",
        OPEN_METEO,
    ),
    (
        "python argparse",
        "Python argparse Documentation",
        "https://docs.python.org/3/library/argparse.html",
        PYTHON_ARGPARSE,
    ),
    (
        "python urllib",
        "Python urllib Documentation",
        "https://docs.python.org/3/library/urllib.html",
        PYTHON_URLLIB,
    ),
    (
        "python unittest",
        "Python unittest Documentation",
        "https://docs.python.org/3/library/unittest.html",
        PYTHON_UNITTEST,
    ),
];

const OPEN_METEO: &str = r#"
# Open-Meteo Weather API

Free weather API with no API key required.

## Endpoints

### Current Weather
GET https://api.open-meteo.com/v1/forecast

Parameters:
- latitude (required): Latitude in decimal degrees
- longitude (required): Longitude in decimal degrees
- current_weather=true: Get current conditions

Example:
https://api.open-meteo.com/v1/forecast?latitude=52.52&longitude=13.41&current_weather=true

Response:
{
  "current_weather": {
    "temperature": 15.2,
    "windspeed": 12.3,
    "winddirection": 180,
    "weathercode": 2,
    "time": "2024-01-15T12:00"
  }
}

### Geocoding API
GET https://geocoding-api.open-meteo.com/v1/search

Parameters:
- name (required): City name to search

Example:
https://geocoding-api.open-meteo.com/v1/search?name=London

Response:
{
  "results": [
    {
      "name": "London",
      "latitude": 51.5074,
      "longitude": -0.1278,
      "country": "United Kingdom",
      "country_code": "GB"
    }
  ]
}

Weather Codes:
0: Clear sky
1-3: Partly cloudy
45-48: Fog
51-55: Drizzle
61-65: Rain
71-75: Snow
95-99: Thunderstorm
"#;

const PYTHON_ARGPARSE: &str = r#"
# argparse — Parser for command-line options

## Basic Usage

```python
import argparse

parser = argparse.ArgumentParser(description='Process some integers.')
parser.add_argument('integers', metavar='N', type=int, nargs='+',
                    help='an integer for the accumulator')
parser.add_argument('--sum', dest='accumulate', action='store_const',
                    const=sum, default=max,
                    help='sum the integers (default: find the max)')

args = parser.parse_args()
```

## Subcommands

```python
parser = argparse.ArgumentParser()
subparsers = parser.add_subparsers(dest='command')

# Create subcommand
parser_a = subparsers.add_parser('command_a', help='Command A help')
parser_a.add_argument('foo', type=int, help='foo help')

args = parser.parse_args()
if args.command == 'command_a':
    print(args.foo)
```
"#;

const PYTHON_URLLIB: &str = r#"
# urllib — URL handling modules

## urllib.request — Extensible library for opening URLs

```python
import urllib.request
import json

# Simple GET request
url = 'https://api.example.com/data'
with urllib.request.urlopen(url) as response:
    data = json.loads(response.read().decode())

# With timeout
with urllib.request.urlopen(url, timeout=10) as response:
    html = response.read()

# With headers
req = urllib.request.Request(url)
req.add_header('User-Agent', 'Mozilla/5.0')
with urllib.request.urlopen(req) as response:
    data = response.read()
```

## urllib.parse — Parse URLs

```python
from urllib.parse import urlencode, quote

# Build query string
params = {'name': 'London', 'count': 5}
query = urlencode(params)  # 'name=London&count=5'

# URL encode
safe_string = quote('hello world')  # 'hello%20world'
```
"#;

const PYTHON_UNITTEST: &str = r#"
# unittest — Unit testing framework

## Basic Test Case

```python
import unittest

class TestStringMethods(unittest.TestCase):

    def test_upper(self):
        self.assertEqual('foo'.upper(), 'FOO')

    def test_isupper(self):
        self.assertTrue('FOO'.isupper())
        self.assertFalse('Foo'.isupper())

    def test_split(self):
        s = 'hello world'
        self.assertEqual(s.split(), ['hello', 'world'])
        # check that s.split fails when the separator is not a string
        with self.assertRaises(TypeError):
            s.split(2)

if __name__ == '__main__':
    unittest.main()
```

## Assertions

- assertEqual(a, b)
- assertNotEqual(a, b)
- assertTrue(x)
- assertFalse(x)
- assertIs(a, b)
- assertIsNot(a, b)
- assertIsNone(x)
- assertIsNotNone(x)
- assertIn(a, b)
- assertRaises(exc, fun, *args, **kwds)
"#;
