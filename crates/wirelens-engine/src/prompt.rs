use serde_json::{json, Value};

use crate::codec::EncodedImage;
use crate::gallery::ReferenceGallery;

/// Fixed decision rubric for the inspection call. Encodes the
/// comparison criteria, the unanalyzable-input escape clause, and the
/// strict two-field output contract the decision parser relies on.
const INSPECTION_RUBRIC: &str = "당신은 스위치 전선 결선 상태를 비교하여 판단하는 정밀 시각 AI입니다.\n\n\
정상 여부의 판단 기준은 아래와 같습니다:\n\
1. 전선의 색상, 위치, 개수, 방향이 기준 이미지와 대체로 동일해야 합니다.\n\
2. 전체 결선 구조가 유사하고 연결 실수가 없으면 '정상'으로 판단하십시오.\n\
3. 눈에 띄는 차이, 빠진 선, 다른 위치의 결선이 있으면 '비정상'입니다.\n\n\
4. 문제가 생기거나 분석할 수 없으면 반드시 아래를 출력하세요.:\n\
{\"판단\": \"판독 불가\",\n\"이유\": \"이미지를 분석할 수 없습니다.\"\n}\
5. 출력은 반드시 아래 형식에 맞춰주세요. 다른 말은 절대 하지 마세요:\n\
{\"판단\": \"정상 or 비정상\",\n\
\"이유\": \"만약 비정상이라면, 어떤 점이 다른지 단순하고 명확하게 설명하세요. 비정상이라면 예시 이미지를 언급하지 말고, 정상이라면 `해당 없음`으로 표기하세요.\"\n}";

const NORMAL_EXEMPLAR_LABEL: &str = "이 이미지는 정상적으로 결선된 스위치입니다.";
const SUBJECT_INSTRUCTION: &str = "이 이미지를 판단해서 위의 양식에 맞춰 답하세요.";

/// Ordered chat messages for one inspection: rubric, exemplars, then
/// the subject. Order matters; the model conditions on the exemplars
/// before judging the subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasoningRequest {
    pub messages: Vec<Value>,
}

/// Assembles the reasoning request from the cached gallery and the
/// freshly encoded subject. Pure; no I/O.
pub fn build_inspection_request(
    subject: &EncodedImage,
    gallery: &ReferenceGallery,
) -> ReasoningRequest {
    let mut messages = vec![
        json!({"role": "system", "content": INSPECTION_RUBRIC}),
        image_message(
            NORMAL_EXEMPLAR_LABEL,
            gallery.normal.first().map(EncodedImage::data_url).unwrap_or_default(),
        ),
    ];
    for (idx, exemplar) in gallery.abnormal.iter().enumerate() {
        messages.push(image_message(
            &format!("이 이미지는 비정상 스위치 예시 {}입니다.", idx + 1),
            exemplar.data_url(),
        ));
    }
    messages.push(image_message(SUBJECT_INSTRUCTION, subject.data_url()));
    ReasoningRequest { messages }
}

fn image_message(text: &str, data_url: String) -> Value {
    json!({
        "role": "user",
        "content": [
            {"type": "text", "text": text},
            {"type": "image_url", "image_url": {"url": data_url}},
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(tag: &str) -> EncodedImage {
        EncodedImage {
            media_type: "image/jpeg",
            data: format!("b64-{tag}"),
        }
    }

    fn gallery(abnormal_count: usize) -> ReferenceGallery {
        ReferenceGallery {
            normal: vec![encoded("normal")],
            abnormal: (0..abnormal_count)
                .map(|idx| encoded(&format!("abnormal-{idx}")))
                .collect(),
        }
    }

    fn text_of(message: &Value) -> &str {
        message["content"][0]["text"].as_str().unwrap_or_default()
    }

    fn url_of(message: &Value) -> &str {
        message["content"][1]["image_url"]["url"]
            .as_str()
            .unwrap_or_default()
    }

    #[test]
    fn message_order_is_rubric_normal_abnormals_subject() {
        let request = build_inspection_request(&encoded("subject"), &gallery(2));
        assert_eq!(request.messages.len(), 5);

        assert_eq!(request.messages[0]["role"], "system");
        let rubric = request.messages[0]["content"].as_str().unwrap_or_default();
        assert!(rubric.contains("판단"));
        assert!(rubric.contains("비정상"));
        assert!(rubric.contains("판독 불가"));

        assert!(text_of(&request.messages[1]).contains("정상적으로 결선된"));
        assert!(url_of(&request.messages[1]).contains("b64-normal"));

        assert_eq!(text_of(&request.messages[2]), "이 이미지는 비정상 스위치 예시 1입니다.");
        assert_eq!(text_of(&request.messages[3]), "이 이미지는 비정상 스위치 예시 2입니다.");
        assert!(url_of(&request.messages[3]).contains("b64-abnormal-1"));

        let subject = request.messages.last().expect("subject message");
        assert!(text_of(subject).contains("판단해서"));
        assert!(url_of(subject).contains("b64-subject"));
    }

    #[test]
    fn image_parts_use_data_urls() {
        let request = build_inspection_request(&encoded("subject"), &gallery(1));
        for message in &request.messages[1..] {
            assert!(url_of(message).starts_with("data:image/jpeg;base64,"));
        }
    }

    #[test]
    fn builder_is_deterministic() {
        let subject = encoded("subject");
        let gallery = gallery(3);
        assert_eq!(
            build_inspection_request(&subject, &gallery),
            build_inspection_request(&subject, &gallery)
        );
    }
}
