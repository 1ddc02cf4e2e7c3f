pub fn render_password_reset(code: &str, verify_url: &str, ttl_minutes: i64) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>Password Reset</h2>
    <p>Here's your verification code:</p>
    <p style="font-size: 28px; letter-spacing: 6px; font-weight: bold;">{code}</p>
    <p>Or click the link to continue:</p>
    <p><a href="{verify_url}" style="display: inline-block; padding: 10px 20px; background: #0070f3; color: white; text-decoration: none; border-radius: 4px;">Reset Password</a></p>
    <p style="color: #666; font-size: 14px;">This code expires in {ttl_minutes} minutes. If you didn't request this, you can ignore it.</p>
</body>
</html>"#
    )
}

pub fn render_password_reset_text(code: &str, verify_url: &str) -> String {
    format!("Here's your verification code: {code}\n\nOr open this link to continue: {verify_url}\n")
}
