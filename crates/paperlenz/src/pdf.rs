//! Text extraction from uploaded PDF documents.
//!
//! Uploads arrive either as raw bytes (the CLI reads a file) or as a
//! `data:application/pdf;base64,...` URL (the HTTP service receives what a browser produced).
//! Both end up as a [`PdfDocument`] whose [`PdfDocument::text`] is what gets analyzed.

use base64::{engine::general_purpose::STANDARD, Engine};
use lopdf::{Dictionary, Document};

use super::*;

/// Prefix of a base64 PDF data URL.
pub const PDF_DATA_URL_PREFIX: &str = "data:application/pdf;base64,";

/// Byte order mark of a UTF-16BE PDF text string.
const UTF16_BE_BOM: [u8; 2] = [0xFE, 0xFF];

/// Document information dictionary entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfMetadata {
  /// `/Title`
  pub title:    Option<String>,
  /// `/Author`
  pub author:   Option<String>,
  /// `/Subject`
  pub subject:  Option<String>,
  /// `/Keywords`
  pub keywords: Option<String>,
}

/// Text of one page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContent {
  /// One-based page number
  pub page_number: u32,
  /// Extracted text
  pub text:        String,
}

/// Metadata and page text of a PDF.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfDocument {
  /// Information dictionary
  pub metadata: PdfMetadata,
  /// Pages in order
  pub pages:    Vec<PageContent>,
}

impl PdfDocument {
  /// Loads and extracts a PDF file.
  pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    debug!("Extracting PDF text from {}", path.display());
    Self::extract(&Document::load(path)?)
  }

  /// Extracts a PDF held in memory.
  pub fn from_bytes(bytes: &[u8]) -> Result<Self> { Self::extract(&Document::load_mem(bytes)?) }

  /// Extracts a PDF from a base64 data URL.
  ///
  /// # Errors
  ///
  /// Fails with [`PaperLenzError::InvalidSubmission`] when `url` is not a PDF data URL, and with
  /// a decoding or PDF error when its payload is unusable.
  pub fn from_data_url(url: &str) -> Result<Self> {
    let bytes = decode_data_url(url)?.ok_or_else(|| {
      PaperLenzError::InvalidSubmission("Expected a data:application/pdf;base64 URL".into())
    })?;
    Self::from_bytes(&bytes)
  }

  /// Concatenated text of all pages, separated by blank lines.
  pub fn text(&self) -> String {
    self
      .pages
      .iter()
      .map(|page| page.text.trim())
      .filter(|text| !text.is_empty())
      .collect::<Vec<_>>()
      .join("\n\n")
  }

  /// Reads metadata and the text of every page.
  ///
  /// A page whose text cannot be extracted is logged and kept with empty text.
  fn extract(doc: &Document) -> Result<Self> {
    let metadata = extract_metadata(doc);

    let pages = doc
      .get_pages()
      .into_keys()
      .map(|page_number| {
        let text = doc.extract_text(&[page_number]).unwrap_or_else(|e| {
          warn!("Could not extract text of page {page_number}: {e}");
          String::new()
        });
        PageContent { page_number, text }
      })
      .collect::<Vec<_>>();

    trace!("Extracted {} pages", pages.len());
    Ok(Self { metadata, pages })
  }
}

/// Decodes a PDF data URL. Returns `Ok(None)` when `content` is not one.
pub fn decode_data_url(content: &str) -> Result<Option<Vec<u8>>> {
  match content.trim().strip_prefix(PDF_DATA_URL_PREFIX) {
    Some(payload) => Ok(Some(STANDARD.decode(payload.trim())?)),
    None => Ok(None),
  }
}

/// Encodes PDF bytes as a data URL.
pub fn encode_data_url(bytes: &[u8]) -> String {
  format!("{PDF_DATA_URL_PREFIX}{}", STANDARD.encode(bytes))
}

/// Reads the document information dictionary, which may be missing.
fn extract_metadata(doc: &Document) -> PdfMetadata {
  let info = doc.trailer.get(b"Info").ok().and_then(|object| match object.as_reference() {
    Ok(reference) => doc.get_object(reference).and_then(|object| object.as_dict()).ok(),
    Err(_) => object.as_dict().ok(),
  });

  let Some(info) = info else {
    return PdfMetadata::default();
  };

  PdfMetadata {
    title:    text_entry(info, "Title"),
    author:   text_entry(info, "Author"),
    subject:  text_entry(info, "Subject"),
    keywords: text_entry(info, "Keywords"),
  }
}

/// Decodes a text string entry, honouring the UTF-16BE byte order mark.
fn text_entry(dict: &Dictionary, key: &str) -> Option<String> {
  let bytes = dict.get(key.as_bytes()).ok()?.as_str().ok()?;
  let text = match bytes.strip_prefix(&UTF16_BE_BOM) {
    Some(utf16) => char::decode_utf16(
      utf16.chunks_exact(2).map(|pair| u16::from_be_bytes([pair[0], pair[1]])),
    )
    .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
    .collect(),
    None => String::from_utf8_lossy(bytes).into_owned(),
  };
  (!text.trim().is_empty()).then_some(text)
}

#[cfg(test)]
pub(crate) mod tests {
  use lopdf::{
    content::{Content, Operation},
    dictionary, Object, Stream, StringFormat,
  };

  use super::*;

  /// Builds a one-page PDF showing `text`, with an information dictionary.
  pub(crate) fn sample_pdf(text: &str, title: Option<&str>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
      "Type" => "Font",
      "Subtype" => "Type1",
      "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
      "Font" => dictionary! {
        "F1" => font_id,
      },
    });
    let content = Content {
      operations: vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 12.into()]),
        Operation::new("Td", vec![72.into(), 720.into()]),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
      ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
      "Type" => "Page",
      "Parent" => pages_id,
      "Contents" => content_id,
    });
    let pages = dictionary! {
      "Type" => "Pages",
      "Kids" => vec![page_id.into()],
      "Count" => 1,
      "Resources" => resources_id,
      "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
      "Type" => "Catalog",
      "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    if let Some(title) = title {
      let mut utf16 = UTF16_BE_BOM.to_vec();
      utf16.extend("Ada Lovelace".encode_utf16().flat_map(u16::to_be_bytes));
      let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(title),
        "Author" => Object::String(utf16, StringFormat::Hexadecimal),
      });
      doc.trailer.set("Info", info_id);
    }

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
  }

  #[test]
  fn test_extracts_text_and_metadata() {
    let bytes = sample_pdf("Neural networks for protein folding", Some("Folding Study"));
    let pdf = PdfDocument::from_bytes(&bytes).unwrap();

    assert_eq!(pdf.pages.len(), 1);
    assert_eq!(pdf.pages[0].page_number, 1);
    assert!(pdf.text().contains("Neural networks for protein folding"));
    assert_eq!(pdf.metadata.title.as_deref(), Some("Folding Study"));
    assert_eq!(pdf.metadata.author.as_deref(), Some("Ada Lovelace"));
    assert_eq!(pdf.metadata.subject, None);
  }

  #[test]
  fn test_missing_info_dictionary() {
    let pdf = PdfDocument::from_bytes(&sample_pdf("Body", None)).unwrap();
    assert_eq!(pdf.metadata, PdfMetadata::default());
  }

  #[test]
  fn test_from_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("paper.pdf");
    std::fs::write(&path, sample_pdf("Stored on disk", None)).unwrap();
    assert!(PdfDocument::from_path(&path).unwrap().text().contains("Stored on disk"));
  }

  #[test]
  fn test_data_url() {
    let bytes = sample_pdf("Uploaded through a browser", None);
    let url = encode_data_url(&bytes);
    assert!(url.starts_with(PDF_DATA_URL_PREFIX));
    assert_eq!(decode_data_url(&url).unwrap().unwrap(), bytes);

    let pdf = PdfDocument::from_data_url(&url).unwrap();
    assert!(pdf.text().contains("Uploaded through a browser"));

    assert_eq!(decode_data_url("plain text").unwrap(), None);
    assert!(matches!(
      decode_data_url("data:application/pdf;base64,@@@"),
      Err(PaperLenzError::Base64(_))
    ));
    assert!(matches!(
      PdfDocument::from_data_url("not a data url"),
      Err(PaperLenzError::InvalidSubmission(_))
    ));
  }

  #[test]
  fn test_garbage_is_rejected() {
    assert!(matches!(PdfDocument::from_bytes(b"not a pdf"), Err(PaperLenzError::Lopdf(_))));
  }
}
