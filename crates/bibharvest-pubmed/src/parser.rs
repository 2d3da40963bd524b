//! PubMed efetch XML parser using quick-xml
//!
//! Streaming parser for `PubmedArticleSet` documents. Each level reads
//! only its direct children and skips everything else, so a `<PMID>`
//! nested in a comments/corrections block never overwrites the article's
//! own identifier.

use anyhow::{Context, Result, bail};
use bibharvest_core::xml::{clean_text, decode_text, local_name_bytes};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

type XmlReader<'a> = Reader<&'a [u8]>;

const TRUNCATED: &str = "XML document ended inside an open element";

/// Fields pulled from one `<PubmedArticle>`
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PubmedArticle {
    pub pmid: String,
    pub title: Option<String>,
    pub journal: Option<String>,
    pub year: Option<i32>,
    pub authors: Vec<Author>,
    pub doi: Option<String>,
    pub pmc_id: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Author {
    pub last_name: Option<String>,
    pub initials: Option<String>,
    pub collective_name: Option<String>,
}

impl Author {
    /// Collective name, else "Last Initials", else last name alone.
    pub fn display_name(&self) -> Option<String> {
        match (&self.collective_name, &self.last_name, &self.initials) {
            (Some(collective), _, _) => Some(collective.clone()),
            (None, Some(last), Some(initials)) => Some(format!("{last} {initials}")),
            (None, Some(last), None) => Some(last.clone()),
            (None, None, _) => None,
        }
    }
}

/// Result of parsing one efetch response.
#[derive(Debug, Default)]
pub struct ParseResult {
    pub articles: Vec<PubmedArticle>,
    /// `<PubmedArticle>` nodes without a PMID or without an `<Article>`
    pub skipped: usize,
}

/// Raw values gathered while walking an article, resolved at the end.
#[derive(Default)]
struct ArticleDraft {
    article: PubmedArticle,
    pmid: Option<String>,
    has_body: bool,
    year_text: Option<String>,
    medline_date: Option<String>,
}

/// Parse every top-level `<PubmedArticle>` in an efetch response.
///
/// Malformed XML is an error; an article missing its PMID or `<Article>`
/// is counted in [`ParseResult::skipped`] and left out.
pub fn parse_pubmed_xml(xml: &[u8]) -> Result<ParseResult> {
    let mut reader = Reader::from_reader(xml);
    let mut result = ParseResult::default();
    let mut buf = Vec::new();
    let mut depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf).context("XML parse error")? {
            Event::Start(e) if depth == 1 => {
                if local(&e) == b"PubmedArticle" {
                    match parse_article(&mut reader)? {
                        Some(article) => result.articles.push(article),
                        None => result.skipped += 1,
                    }
                } else {
                    skip_element(&mut reader)?;
                }
            }
            Event::Start(_) => depth += 1,
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if depth > 0 {
        bail!(TRUNCATED);
    }
    Ok(result)
}

fn local<'e>(e: &'e BytesStart) -> &'e [u8] {
    local_name_bytes(e.name().into_inner())
}

fn parse_article(reader: &mut XmlReader) -> Result<Option<PubmedArticle>> {
    let mut draft = ArticleDraft::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match local(&e) {
                b"MedlineCitation" => parse_medline_citation(reader, &mut draft)?,
                b"PubmedData" => parse_pubmed_data(reader, &mut draft.article)?,
                _ => skip_element(reader)?,
            },
            Event::End(_) => break,
            Event::Eof => bail!(TRUNCATED),
            _ => {}
        }
        buf.clear();
    }

    let Some(pmid) = draft.pmid else {
        log::debug!("Skipping article without PMID");
        return Ok(None);
    };
    if !draft.has_body {
        log::debug!("Skipping PMID {pmid}: no <Article> element");
        return Ok(None);
    }

    let mut article = draft.article;
    article.pmid = pmid;
    article.year = derive_year(draft.year_text.as_deref(), draft.medline_date.as_deref());
    Ok(Some(article))
}

fn parse_medline_citation(reader: &mut XmlReader, draft: &mut ArticleDraft) -> Result<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match local(&e) {
                b"PMID" => draft.pmid = read_text(reader)?,
                b"Article" => {
                    draft.has_body = true;
                    parse_article_element(reader, draft)?;
                }
                _ => skip_element(reader)?,
            },
            Event::Empty(e) if local(&e) == b"Article" => draft.has_body = true,
            Event::End(_) => break,
            Event::Eof => bail!(TRUNCATED),
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

fn parse_article_element(reader: &mut XmlReader, draft: &mut ArticleDraft) -> Result<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match local(&e) {
                b"Journal" => parse_journal(reader, draft)?,
                b"ArticleTitle" => draft.article.title = read_text(reader)?,
                b"AuthorList" => draft.article.authors = parse_author_list(reader)?,
                _ => skip_element(reader)?,
            },
            Event::End(_) => break,
            Event::Eof => bail!(TRUNCATED),
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

fn parse_journal(reader: &mut XmlReader, draft: &mut ArticleDraft) -> Result<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match local(&e) {
                b"Title" => draft.article.journal = read_text(reader)?,
                b"JournalIssue" => parse_journal_issue(reader, draft)?,
                _ => skip_element(reader)?,
            },
            Event::End(_) => break,
            Event::Eof => bail!(TRUNCATED),
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

fn parse_journal_issue(reader: &mut XmlReader, draft: &mut ArticleDraft) -> Result<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match local(&e) {
                b"PubDate" => parse_pub_date(reader, draft)?,
                _ => skip_element(reader)?,
            },
            Event::End(_) => break,
            Event::Eof => bail!(TRUNCATED),
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

fn parse_pub_date(reader: &mut XmlReader, draft: &mut ArticleDraft) -> Result<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match local(&e) {
                b"Year" => draft.year_text = read_text(reader)?,
                b"MedlineDate" => draft.medline_date = read_text(reader)?,
                _ => skip_element(reader)?,
            },
            Event::End(_) => break,
            Event::Eof => bail!(TRUNCATED),
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

/// Numeric `<Year>` wins; otherwise the first standalone 4-digit token of
/// `<MedlineDate>` ("2020 Jan-Feb" -> 2020).
pub fn derive_year(year: Option<&str>, medline_date: Option<&str>) -> Option<i32> {
    if let Some(year) = year.filter(|y| is_digits(y)) {
        if let Ok(year) = year.parse() {
            return Some(year);
        }
    }
    medline_date?
        .split_whitespace()
        .find(|token| token.len() == 4 && is_digits(token))
        .and_then(|token| token.parse().ok())
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn parse_author_list(reader: &mut XmlReader) -> Result<Vec<Author>> {
    let mut authors = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match local(&e) {
                b"Author" => authors.push(parse_author(reader)?),
                _ => skip_element(reader)?,
            },
            Event::End(_) => break,
            Event::Eof => bail!(TRUNCATED),
            _ => {}
        }
        buf.clear();
    }

    Ok(authors)
}

fn parse_author(reader: &mut XmlReader) -> Result<Author> {
    let mut author = Author::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match local(&e) {
                b"LastName" => author.last_name = read_text(reader)?,
                b"Initials" => author.initials = read_text(reader)?,
                b"CollectiveName" => author.collective_name = read_text(reader)?,
                _ => skip_element(reader)?,
            },
            Event::End(_) => break,
            Event::Eof => bail!(TRUNCATED),
            _ => {}
        }
        buf.clear();
    }

    Ok(author)
}

fn parse_pubmed_data(reader: &mut XmlReader, article: &mut PubmedArticle) -> Result<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match local(&e) {
                b"ArticleIdList" => parse_article_id_list(reader, article)?,
                _ => skip_element(reader)?,
            },
            Event::End(_) => break,
            Event::Eof => bail!(TRUNCATED),
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

fn parse_article_id_list(reader: &mut XmlReader, article: &mut PubmedArticle) -> Result<()> {
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if local(&e) == b"ArticleId" => {
                let mut id_type = Vec::new();
                for attr in e.attributes().flatten() {
                    if local_name_bytes(attr.key.as_ref()) == b"IdType" {
                        id_type = attr.value.into_owned();
                    }
                }
                // Later entries of the same type win, empty ones never do
                if let Some(value) = read_text(reader)? {
                    match id_type.as_slice() {
                        b"doi" => article.doi = Some(value),
                        b"pmc" => article.pmc_id = Some(value),
                        _ => {}
                    }
                }
            }
            Event::Start(_) => skip_element(reader)?,
            Event::End(_) => break,
            Event::Eof => bail!(TRUNCATED),
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

/// Skip to the end of the element whose start tag was just read.
fn skip_element(reader: &mut XmlReader) -> Result<()> {
    let mut buf = Vec::new();
    let mut depth = 1;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Event::Eof => bail!(TRUNCATED),
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

/// Flattened text of the element whose start tag was just read,
/// including nested markup (`<i>`, `<sup>`, ...), trimmed.
fn read_text(reader: &mut XmlReader) -> Result<Option<String>> {
    let mut buf = Vec::new();
    let mut text = String::new();
    let mut depth = 1;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Text(e) => text.push_str(&decode_text(&e)),
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e)),
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Event::Eof => bail!(TRUNCATED),
            _ => {}
        }
        buf.clear();
    }

    Ok(clean_text(&text))
}
