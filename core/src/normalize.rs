//! Collapse every HTTP outcome into one result shape.
//!
//! The service is inconsistent about returning bodies on successful calls,
//! so callers get a JSON value for every outcome instead of branching on
//! status and body presence. A body that parses is returned untouched; the
//! other outcomes become small status objects whose text existing callers
//! match on, so the literals below must not change.

use serde_json::{json, Value};

use crate::http::HttpResponse;

/// The uniform value returned by every endpoint call.
pub type NormalizedResult = Value;

pub const NO_RESULT: &str = "Results is type None";
pub const NOT_MODIFIED_MESSAGE: &str = "No metadata fields provided for update";
pub const NO_CONTENT_204_MESSAGE: &str = "Response returned a 204 with no content";
pub const NO_CONTENT_200_MESSAGE: &str = "Response returned a 200 with no content";

/// Normalize a response, or the absence of one.
pub fn normalize(outcome: Option<&HttpResponse>) -> NormalizedResult {
    let Some(response) = outcome else {
        return json!({ "status": NO_RESULT });
    };

    if let Ok(body) = serde_json::from_slice::<Value>(&response.body) {
        return body;
    }

    match response.status {
        304 => json!({ "message": NOT_MODIFIED_MESSAGE }),
        204 => json!({ "status": "Success", "message": NO_CONTENT_204_MESSAGE }),
        200 => json!({ "status": "Success", "message": NO_CONTENT_200_MESSAGE }),
        code => json!({
            "status": format!("Result code of request is {code}. Could not convert to JSON.")
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn missing_outcome() {
        assert_eq!(normalize(None), json!({"status": "Results is type None"}));
    }

    #[test]
    fn empty_bodies_on_known_statuses() {
        assert_eq!(
            normalize(Some(&response(304, ""))),
            json!({"message": "No metadata fields provided for update"})
        );
        assert_eq!(
            normalize(Some(&response(204, ""))),
            json!({"status": "Success", "message": "Response returned a 204 with no content"})
        );
        assert_eq!(
            normalize(Some(&response(200, ""))),
            json!({"status": "Success", "message": "Response returned a 200 with no content"})
        );
    }

    #[test]
    fn unparseable_body_on_other_status_names_the_code() {
        for code in [201, 400, 401, 404, 500, 502] {
            assert_eq!(
                normalize(Some(&response(code, "<html>gateway</html>"))),
                json!({"status": format!("Result code of request is {code}. Could not convert to JSON.")})
            );
        }
    }

    #[test]
    fn parsed_bodies_pass_through_for_every_status() {
        for code in [200, 204, 304, 401, 404, 500] {
            let out = normalize(Some(&response(code, r#"{"message":"no Route matched with those values"}"#)));
            assert_eq!(out, json!({"message": "no Route matched with those values"}));
        }
    }

    #[test]
    fn non_object_bodies_are_not_wrapped() {
        assert_eq!(normalize(Some(&response(200, r#"[{"id":"a1"}]"#))), json!([{"id": "a1"}]));
        assert_eq!(normalize(Some(&response(200, "42"))), json!(42));
    }

    #[test]
    fn binary_body_falls_back_on_status() {
        let bytes = |status| HttpResponse {
            status,
            headers: Vec::new(),
            body: vec![0x50, 0x4b, 0x03, 0x04, 0xff, 0xfe, 0x00],
        };
        assert_eq!(
            normalize(Some(&bytes(200))),
            json!({"status": "Success", "message": "Response returned a 200 with no content"})
        );
        assert_eq!(
            normalize(Some(&bytes(502))),
            json!({"status": "Result code of request is 502. Could not convert to JSON."})
        );
    }
}
