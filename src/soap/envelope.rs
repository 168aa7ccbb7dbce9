//! The fixed protocol envelope and the response body decoder.
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::de::DeserializeOwned;

use crate::error::Error;

pub(crate) const SOAP_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/" xmlns:SOAP-ENC="http://schemas.xmlsoap.org/soap/encoding/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:xop="http://www.w3.org/2004/08/xop/include" xmlns:xmlmime="http://www.w3.org/2004/11/xmlmime" xmlns:ns="urn:zarafa"><SOAP-ENV:Body SOAP-ENV:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">"#;

pub(crate) const SOAP_FOOTER: &str = "</SOAP-ENV:Body></SOAP-ENV:Envelope>";

/// Wrap an operation fragment in the protocol envelope.
pub fn envelope(payload: &str) -> String {
    let mut body = String::with_capacity(SOAP_HEADER.len() + payload.len() + SOAP_FOOTER.len());
    body.push_str(SOAP_HEADER);
    body.push_str(payload);
    body.push_str(SOAP_FOOTER);
    body
}

/// Decode the response element nested under the envelope's `Body` into a
/// typed result.
///
/// The scan walks forward through the document until the first start element
/// whose local name is exactly `Body`, wherever it sits between its
/// siblings, and decodes everything nested under it. A document without a
/// `Body` element is a decode failure.
pub fn decode_body<T: DeserializeOwned>(response: &[u8]) -> Result<T, Error> {
    let text = std::str::from_utf8(response)
        .map_err(|_| Error::ResponseDecode("response is not valid UTF-8".to_string()))?;

    let mut reader = Reader::from_str(text);
    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) if element.local_name().as_ref() == b"Body" => {
                let span = reader
                    .read_to_end(element.name())
                    .map_err(|err| Error::ResponseDecode(err.to_string()))?;
                let inner = &text[span.start as usize..span.end as usize];
                return quick_xml::de::from_str(inner.trim())
                    .map_err(|err| Error::ResponseDecode(err.to_string()));
            }
            Ok(Event::Eof) => return Err(Error::BodyNotFound),
            Ok(_) => {}
            Err(err) => return Err(Error::ResponseDecode(err.to_string())),
        }
    }
}
