use chrono::{Days, NaiveDate};
use shared::error::{AppError, AppResult};

/// チェックイン日からチェックアウト日までの半開区間 [check_in, check_out)。
/// チェックアウト日の夜は含まない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StayRange {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

/// 一回の予約で泊まれる最大泊数
pub const MAX_STAY_NIGHTS: i64 = 30;

impl StayRange {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> AppResult<Self> {
        Self::within(check_in, check_out, MAX_STAY_NIGHTS)
    }

    /// 泊数の上限を指定して作る。カレンダー表示など予約以外の期間に使う
    pub fn within(check_in: NaiveDate, check_out: NaiveDate, max_nights: i64) -> AppResult<Self> {
        if check_out <= check_in {
            return Err(AppError::ValidationError(format!(
                "チェックアウト日（{check_out}）はチェックイン日（{check_in}）より後である必要があります。"
            )));
        }
        let range = Self {
            check_in,
            check_out,
        };
        if range.nights() > max_nights {
            return Err(AppError::ValidationError(format!(
                "期間は {max_nights} 泊以内で指定してください（指定 {} 泊）。",
                range.nights()
            )));
        }
        Ok(range)
    }

    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    // existing.check_in < requested.check_out AND existing.check_out > requested.check_in
    pub fn overlaps(&self, other: &StayRange) -> bool {
        self.check_in < other.check_out && self.check_out > other.check_in
    }

    pub fn contains_night(&self, night: NaiveDate) -> bool {
        self.check_in <= night && night < self.check_out
    }

    /// 宿泊する各夜の日付を昇順で返す
    pub fn nights_iter(&self) -> impl Iterator<Item = NaiveDate> {
        let check_out = self.check_out;
        std::iter::successors(Some(self.check_in), |d| d.checked_add_days(Days::new(1)))
            .take_while(move |d| *d < check_out)
    }
}
