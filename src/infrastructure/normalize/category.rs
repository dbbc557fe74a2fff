//! Category normalization and keyword inference

use once_cell::sync::Lazy;

use super::pattern::Pattern;

pub const DEFAULT_CATEGORY: &str = "기타";
pub const HARDWARE_CATEGORY: &str = "컴퓨터/부품";

/// Board labels folded into shared buckets
const LABEL_MAP: &[(&str, &str)] = &[
    ("컴퓨터", "전자"),
    ("디지털", "전자"),
    ("PC/하드웨어", "전자"),
    ("모바일/태블릿", "전자"),
    ("가전", "전자"),
    ("가전/가구", "생활/가전"),
    ("생활/주방", "생활/가전"),
    ("인테리어", "생활/가전"),
    ("생활용품", "생활/가전"),
    ("의류/잡화", "패션"),
    ("의류", "패션"),
    ("패션/잡화", "패션"),
    ("신발", "패션"),
    ("화장품", "뷰티"),
    ("뷰티/헬스", "뷰티"),
    ("향수/화장품", "뷰티"),
    ("식품/건강", "식품"),
    ("식품", "식품"),
    ("먹거리", "식품"),
    ("육아", "유아"),
    ("유아/완구", "유아"),
    ("출산/육아", "유아"),
    ("레저/자동차", "스포츠"),
    ("스포츠/레저", "스포츠"),
    ("운동", "스포츠"),
    ("도서/음반", "문화"),
    ("게임", "문화"),
    ("문구/완구", "문화"),
];

/// Title keywords per category, checked in order
const KEYWORD_TABLE: &[(&str, &[&str])] = &[
    (
        "의류/잡화",
        &["의류", "옷", "신발", "가방", "악세서리", "패션", "블랙야크", "나이키", "아디다스"],
    ),
    (
        "식품/건강",
        &["식품", "음식", "건강", "비타민", "영양제", "홍삼", "건강식품"],
    ),
    (
        "가전/디지털",
        &["가전", "전자", "디지털", "컴퓨터", "노트북", "스마트폰", "갤럭시", "아이폰"],
    ),
    (
        "생활/가구",
        &["생활", "가구", "인테리어", "주방", "욕실", "청소", "수납"],
    ),
    ("도서/문구", &["도서", "책", "문구", "필기구", "노트", "다이어리"]),
    (
        "화장품/미용",
        &["화장품", "미용", "스킨케어", "메이크업", "향수", "헤어"],
    ),
];

const HARDWARE_KEYWORDS: &[&str] = &[
    "cpu", "프로세서", "라이젠", "인텔", "그래픽", "gpu", "rtx", "gtx", "radeon", "ram", "메모리",
    "ddr", "ssd", "nvme", "하드", "저장장치", "메인보드", "마더보드", "mainboard", "파워", "psu",
    "전원", "케이스", "쿨러", "쿨링", "모니터", "디스플레이", "키보드", "마우스", "헤드셋",
    "노트북", "laptop",
];

static BRACKETS: Lazy<Pattern> = Lazy::new(|| Pattern::new(r"[\[\]]"));

/// `"[PC/하드웨어]"` → `"전자"`; unknown labels pass through, blanks become 기타
pub fn normalize_category_label(label: &str) -> String {
    let stripped = BRACKETS.replace_all(label, "");
    let stripped = stripped.trim();
    if stripped.is_empty() {
        return DEFAULT_CATEGORY.to_string();
    }
    LABEL_MAP
        .iter()
        .find(|(from, _)| *from == stripped)
        .map_or_else(|| stripped.to_string(), |(_, to)| (*to).to_string())
}

/// First category whose keyword appears in the title
pub fn infer_category(title: &str) -> String {
    let lowered = title.to_lowercase();
    KEYWORD_TABLE
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
        .map_or(DEFAULT_CATEGORY, |(category, _)| *category)
        .to_string()
}

/// PC parts board: hardware keywords win over the generic table
pub fn infer_hardware_category(title: &str) -> String {
    let lowered = title.to_lowercase();
    if HARDWARE_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        HARDWARE_CATEGORY.to_string()
    } else {
        infer_category(title)
    }
}
