//! Just enough PDF reading to tell when a document is usable.
//!
//! Complete files go through `lopdf`. The head of a progressive download
//! cannot be parsed, so the linearization dictionary is sniffed from raw
//! bytes; it must be the first object, so only the first kilobyte is searched.

use comparer_logging::cmp_debug;
use lopdf::Document;

const LINEARIZATION_WINDOW: usize = 1024;

/// Page count announced by the linearization dictionary (`/N`), if the
/// head of the file carries one.
pub fn linearized_page_count(head: &[u8]) -> Option<u32> {
    let window = &head[..head.len().min(LINEARIZATION_WINDOW)];
    let start = find(window, b"/Linearized", 0)?;
    let end = find(window, b">>", start).unwrap_or(window.len());
    let dict = &window[start..end];

    let mut from = 0;
    while let Some(pos) = find(dict, b"/N", from) {
        let after = pos + 2;
        if dict.get(after).is_some_and(|b| is_whitespace(*b)) {
            return read_integer(dict, after);
        }
        from = after;
    }
    None
}

/// Number of pages in a complete document, read from its page tree.
/// `None` when the bytes do not parse or the tree is empty.
pub fn page_count(document: &[u8]) -> Option<u32> {
    match Document::load_mem(document) {
        Ok(parsed) => u32::try_from(parsed.get_pages().len())
            .ok()
            .filter(|pages| *pages > 0),
        Err(err) => {
            cmp_debug!("Could not parse PDF page tree: {err}");
            None
        }
    }
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}

fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\n' | b'\x0c' | b'\0')
}

fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    while bytes.get(pos).is_some_and(|b| is_whitespace(*b)) {
        pos += 1;
    }
    pos
}

fn read_integer(bytes: &[u8], pos: usize) -> Option<u32> {
    let start = skip_whitespace(bytes, pos);
    let digits = bytes[start.min(bytes.len())..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits == 0 {
        return None;
    }
    std::str::from_utf8(&bytes[start..start + digits])
        .ok()?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINEARIZED_HEAD: &[u8] = b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n1 0 obj\n<< /Linearized 1 /L 48213 /H [ 612 140 ] /O 4 /E 9021 /N 12 /T 47890 >>\nendobj\n";

    #[test]
    fn reads_page_count_from_linearization_dictionary() {
        assert_eq!(linearized_page_count(LINEARIZED_HEAD), Some(12));
    }

    #[test]
    fn plain_header_is_not_linearized() {
        let head = b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog /Pages 2 0 R /Names 5 0 R >>\nendobj\n";
        assert_eq!(linearized_page_count(head), None);
    }

    #[test]
    fn linearization_past_first_kilobyte_is_ignored() {
        let mut head = vec![b' '; 2048];
        head.extend_from_slice(b"<< /Linearized 1 /N 3 >>");
        assert_eq!(linearized_page_count(&head), None);
    }

    /// A minimal document with `pages` empty pages under one page tree.
    fn sample_document(pages: usize) -> Vec<u8> {
        use lopdf::{dictionary, Object};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let kids: Vec<Object> = (0..pages)
            .map(|_| {
                doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                })
                .into()
            })
            .collect();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn counts_pages_from_the_page_tree() {
        assert_eq!(page_count(&sample_document(3)), Some(3));
    }

    #[test]
    fn page_marker_inside_stream_data_is_not_a_page() {
        use lopdf::{Dictionary, Object, Stream};

        let mut doc = Document::load_mem(&sample_document(1)).unwrap();
        doc.add_object(Object::Stream(Stream::new(
            Dictionary::new(),
            b"<< /Type /Page >> << /Type /Page >>".to_vec(),
        )));
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        assert_eq!(page_count(&bytes), Some(1));
    }

    #[test]
    fn unparseable_or_empty_documents_have_no_count() {
        assert_eq!(page_count(b"%PDF-1.4 not really"), None);
        assert_eq!(page_count(&sample_document(0)), None);
    }
}
