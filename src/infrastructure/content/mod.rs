pub mod daily_content;
