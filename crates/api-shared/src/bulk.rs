//! Bulk analysis shared by the REST and CLI adapters.

use crate::dto::{AnalyzeReq, BulkAnalyzeItem, BulkErrorRes};
use rxfw_core::PrescriptionFirewall;

/// Validate and analyse a list of requests.
///
/// # Arguments
///
/// * `firewall` - Firewall to run the valid requests through.
/// * `requests` - Requests in submission order.
///
/// # Returns
///
/// One item per request, in the same order: a verdict for each valid request and the
/// validation error, next to the original request, for each invalid one. Invalid requests are
/// never analysed, so they do not show up in the analysis counters.
pub fn analyze_bulk(
    firewall: &PrescriptionFirewall,
    requests: Vec<AnalyzeReq>,
) -> Vec<BulkAnalyzeItem> {
    let mut valid = Vec::with_capacity(requests.len());
    let mut rejected = Vec::with_capacity(requests.len());
    for request in requests {
        match request.validate() {
            Ok(r) => {
                valid.push(r);
                rejected.push(None);
            }
            Err(e) => rejected.push(Some(BulkErrorRes {
                error: e.to_string(),
                request,
            })),
        }
    }

    let mut verdicts = firewall.analyze_batch(&valid).into_iter();
    rejected
        .into_iter()
        .filter_map(|slot| match slot {
            Some(error) => Some(BulkAnalyzeItem::Error(error)),
            None => verdicts.next().map(|v| BulkAnalyzeItem::Analysis(v.into())),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rxfw_core::{CredentialStatus, PrescriberRecord, ReferenceSnapshot};

    fn req(patient: &str, dose: f64) -> AnalyzeReq {
        AnalyzeReq {
            prescriber_id: "DOC001".into(),
            patient_id: patient.into(),
            drug: "aspirin".into(),
            dose,
        }
    }

    fn firewall() -> PrescriptionFirewall {
        PrescriptionFirewall::from_snapshot(ReferenceSnapshot::new(
            Some(vec![PrescriberRecord {
                id: "DOC001".into(),
                name: "Dr. Chen".into(),
                specialty: "General Practice".into(),
                status: CredentialStatus::Active,
                dea_number: "A1234567".into(),
                license_number: String::new(),
            }]),
            Some(vec![]),
        ))
    }

    #[test]
    fn invalid_requests_keep_their_position() {
        let fw = firewall();
        let requests = vec![
            req("P404", 100.0),
            req("  ", 100.0),
            req("P405", -1.0),
            req("P406", 50.0),
        ];
        let items = analyze_bulk(&fw, requests);

        assert_eq!(items.len(), 4);
        match &items[0] {
            BulkAnalyzeItem::Analysis(a) => {
                assert_eq!(a.patient_id, "P404");
                assert_eq!(a.layer1.message, "Patient P404 not found");
            }
            other => panic!("expected analysis, got {other:?}"),
        }
        match &items[1] {
            BulkAnalyzeItem::Error(e) => {
                assert_eq!(e.error, "patient_id cannot be blank");
                assert_eq!(e.request, req("  ", 100.0));
            }
            other => panic!("expected error, got {other:?}"),
        }
        assert!(matches!(&items[2], BulkAnalyzeItem::Error(e) if e.error.starts_with("dose:")));
        assert!(matches!(&items[3], BulkAnalyzeItem::Analysis(a) if a.patient_id == "P406"));
        assert_eq!(fw.metrics().total_analyses(), 2);
    }

    #[test]
    fn empty_list_analyses_nothing() {
        let fw = firewall();
        assert!(analyze_bulk(&fw, Vec::new()).is_empty());
        assert_eq!(fw.metrics().total_analyses(), 0);
    }
}
