//! User-facing strings.
//!
//! The service is Korean-language; every notice shown to the user lives here so the
//! controllers and the presentation layers agree on the exact wording.

pub const PLACEHOLDER: &str = "-";

pub const LABEL_EMOTION: &str = "감정";
pub const LABEL_IMAGERY: &str = "이미지";
pub const LABEL_SYMBOLISM: &str = "상징";
pub const LABEL_TIME_PERIOD: &str = "시대";
pub const LABEL_IMAGE_URL: &str = "이미지 URL";

pub const ANALYSIS_UNAVAILABLE: &str = "AI 분석 데이터가 없습니다.";

// Submission
pub const TEXT_REQUIRED: &str = "기억 내용을 입력해주세요!";
pub const DATE_REQUIRED: &str = "날짜를 입력해주세요!";
pub const RESTORE_FAILED: &str = "복원 실패";
pub const TRANSPORT_ERROR: &str = "서버 요청 중 오류가 발생했습니다.";

// Timeline
pub const TIMELINE_EMPTY: &str = "저장된 기억이 없습니다.";
pub const TIMELINE_LOAD_FAILED: &str = "데이터 로드 중 오류가 발생했습니다.";
pub const NOTHING_SELECTED: &str = "선택된 기억이 없습니다.";
pub const NOTHING_TO_EDIT: &str = "수정할 기억이 없습니다.";
pub const NOTHING_TO_DELETE: &str = "삭제할 기억이 없습니다.";
pub const EDIT_FIELDS_REQUIRED: &str = "내용과 날짜를 모두 입력해주세요.";
pub const CONFIRM_EDIT: &str = "정말 수정하시겠습니까?";
pub const CONFIRM_DELETE: &str = "정말 이 기억을 삭제하시겠습니까?";
pub const EDIT_DONE: &str = "기억 수정 및 이미지 생성이 완료되었습니다.";
pub const DELETE_DONE: &str = "기억이 삭제되었습니다.";
pub const EDIT_FAILED_PREFIX: &str = "수정 실패: ";
pub const DELETE_FAILED_PREFIX: &str = "삭제 실패: ";
pub const GENERIC_FAILURE: &str = "오류 발생";
pub const EDIT_TRANSPORT_ERROR: &str = "서버 오류로 수정에 실패했습니다.";
pub const DELETE_TRANSPORT_ERROR: &str = "서버 오류로 삭제에 실패했습니다.";
pub const EXPORT_DONE_PREFIX: &str = "타임라인을 내보냈습니다: ";
pub const EXPORT_FAILED_PREFIX: &str = "내보내기 실패: ";
